use libdweet::dispatch::PollInterval;
use libdweet::event::{EventHandle, EventList};

struct ButtonPress {
    held_ms: u32,
}

struct App {
    listeners: EventList<App, ButtonPress, 4>,
    short_presses: u32,
    long_presses: u32,
    victim: Option<EventHandle>,
}

impl App {
    fn new() -> Self {
        Self {
            listeners: EventList::new(),
            short_presses: 0,
            long_presses: 0,
            victim: None,
        }
    }
}

fn listeners(app: &mut App) -> &mut EventList<App, ButtonPress, 4> {
    &mut app.listeners
}

fn on_short_press(app: &mut App, press: &ButtonPress) -> PollInterval {
    if press.held_ms < 1_000 {
        app.short_presses += 1;
    }
    PollInterval::Idle
}

fn on_long_press(app: &mut App, press: &ButtonPress) -> PollInterval {
    if press.held_ms >= 1_000 {
        app.long_presses += 1;
        return PollInterval::RunAgain;
    }
    PollInterval::SleepFor(50)
}

#[test]
fn dispatch_reaches_every_listener_and_folds_the_minimum() {
    let mut app = App::new();
    app.listeners.register(on_short_press);
    app.listeners.register(on_long_press);

    let min = EventList::dispatch(&mut app, listeners, &ButtonPress { held_ms: 40 });
    assert_eq!(app.short_presses, 1);
    assert_eq!(app.long_presses, 0);
    assert_eq!(min, PollInterval::SleepFor(50));

    let min = EventList::dispatch(&mut app, listeners, &ButtonPress { held_ms: 2_000 });
    assert_eq!(app.long_presses, 1);
    assert_eq!(min, PollInterval::RunAgain);
}

#[test]
fn dispatch_on_empty_list_is_idle() {
    let mut app = App::new();
    let min = EventList::dispatch(&mut app, listeners, &ButtonPress { held_ms: 10 });
    assert_eq!(min, PollInterval::Idle);
}

fn unregister_victim(app: &mut App, _press: &ButtonPress) -> PollInterval {
    if let Some(victim) = app.victim.take() {
        app.listeners.unregister(victim);
    }
    PollInterval::Idle
}

#[test]
fn listener_removed_mid_dispatch_is_skipped() {
    let mut app = App::new();
    app.listeners.register(unregister_victim);
    app.victim = Some(app.listeners.register(on_short_press));

    EventList::dispatch(&mut app, listeners, &ButtonPress { held_ms: 10 });

    assert_eq!(app.short_presses, 0, "removed listener must not fire");
    assert_eq!(app.listeners.len(), 1);
}

fn register_another(app: &mut App, _press: &ButtonPress) -> PollInterval {
    if app.listeners.len() == 1 {
        app.listeners.register(on_short_press);
    }
    PollInterval::Idle
}

#[test]
fn listener_added_mid_dispatch_fires_next_time() {
    let mut app = App::new();
    app.listeners.register(register_another);

    EventList::dispatch(&mut app, listeners, &ButtonPress { held_ms: 10 });
    assert_eq!(app.short_presses, 0, "new listener joins the next dispatch");

    EventList::dispatch(&mut app, listeners, &ButtonPress { held_ms: 10 });
    assert_eq!(app.short_presses, 1);
}

#[test]
fn stale_handle_does_not_alias_a_reused_slot() {
    let mut app = App::new();
    let first = app.listeners.register(on_short_press);
    app.listeners.unregister(first);
    let second = app.listeners.register(on_long_press);

    assert!(!app.listeners.contains(first));
    assert!(app.listeners.contains(second));
}

#[test]
#[should_panic(expected = "not registered")]
fn unregister_must_pair_with_register() {
    let mut app = App::new();
    let handle = app.listeners.register(on_short_press);
    app.listeners.unregister(handle);
    app.listeners.unregister(handle);
}

#[test]
#[should_panic(expected = "event list full")]
fn registering_past_capacity_panics() {
    let mut app = App::new();
    for _ in 0..5 {
        app.listeners.register(on_short_press);
    }
}
