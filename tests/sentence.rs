use libdweet::sentence::{
    MAX_SENTENCE_LENGTH, Push, SentenceAssembler, SentenceError, checksum, encode, has_checksum,
    validate,
};

fn feed(assembler: &mut SentenceAssembler, bytes: &[u8]) -> Vec<Push> {
    bytes.iter().map(|&b| assembler.push(b)).collect()
}

fn collect_lines(assembler: &mut SentenceAssembler, bytes: &[u8]) -> Vec<String> {
    let mut lines = Vec::new();
    for &byte in bytes {
        if assembler.push(byte) == Push::Complete {
            lines.push(assembler.line().to_string());
            assembler.reset();
        }
    }
    lines
}

#[test]
fn assembly_is_independent_of_fragmentation() {
    let wire = b"$PDWT,GETSTATE=BLINKINTERVAL*5A\n$PDWT,GETSTATE=LED*4A\n";

    // All at once.
    let mut assembler = SentenceAssembler::new();
    let whole = collect_lines(&mut assembler, wire);

    // One byte per "read", as a slow UART would deliver it.
    let mut assembler = SentenceAssembler::new();
    let mut fragmented = Vec::new();
    for &byte in wire.iter() {
        fragmented.extend(collect_lines(&mut assembler, &[byte]));
    }

    assert_eq!(whole, fragmented);
    assert_eq!(whole.len(), 2);
    assert_eq!(whole[0], "$PDWT,GETSTATE=BLINKINTERVAL*5A");
}

#[test]
fn bare_terminator_is_a_sync() {
    let mut assembler = SentenceAssembler::new();
    assert_eq!(assembler.push(b'\n'), Push::Synced);
    assert!(assembler.is_empty());
}

#[test]
fn carriage_returns_are_ignored() {
    let mut assembler = SentenceAssembler::new();
    let lines = collect_lines(&mut assembler, b"$PDWT,GETSTATE=LED*4A\r\n");
    assert_eq!(lines, vec!["$PDWT,GETSTATE=LED*4A".to_string()]);
}

#[test]
fn overflow_discards_and_the_next_terminator_restores_framing() {
    let mut assembler = SentenceAssembler::new();

    // A sentence that never terminates. The buffer fills and is discarded.
    let outcomes = feed(&mut assembler, &[b'A'; MAX_SENTENCE_LENGTH + 1]);
    assert_eq!(outcomes[MAX_SENTENCE_LENGTH], Push::Overflow);

    // Whatever trails the overflow is garbage up to the next terminator;
    // the framer delivers it and validation throws it out.
    assert_eq!(assembler.push(b'A'), Push::Pending);
    assert_eq!(assembler.push(b'\n'), Push::Complete);
    assert_eq!(validate(assembler.line()), Err(SentenceError::InvalidStart));
    assembler.reset();

    // After which a good sentence goes through untouched.
    let lines = collect_lines(&mut assembler, b"$PDWT,GETSTATE=LED*4A\n");
    assert_eq!(lines.len(), 1);
    assert_eq!(validate(&lines[0]), Ok("PDWT,GETSTATE=LED"));
}

#[test]
fn checksum_covers_payload_only() {
    // XOR over the bytes between '$' and '*'.
    assert_eq!(checksum("AB"), 0x03);
    assert_eq!(checksum("$AB"), 0x03);
    assert_eq!(checksum("$AB*FF"), 0x03);
    assert_eq!(checksum("$PDWT,GETSTATE=BLINKINTERVAL*5A"), 0x5A);
}

#[test]
fn validation_rejects_a_corrupted_checksum() {
    assert_eq!(
        validate("$PDWT,GETSTATE=BLINKINTERVAL*5A"),
        Ok("PDWT,GETSTATE=BLINKINTERVAL")
    );
    assert_eq!(
        validate("$PDWT,GETSTATE=BLINKINTERVAL*5B"),
        Err(SentenceError::InvalidChecksum)
    );
    // A corrupted payload byte fails the same way.
    assert_eq!(
        validate("$PDWT,GETSTATE=BLINKINTERVAl*5A"),
        Err(SentenceError::InvalidChecksum)
    );
    // Non-hex checksum digits are a malformed checksum, not a missing one.
    assert_eq!(
        validate("$PDWT,GETSTATE=LED*ZZ"),
        Err(SentenceError::InvalidChecksum)
    );
}

#[test]
fn sentences_without_a_checksum_are_accepted() {
    // Hand-typed sentences commonly omit the checksum field.
    assert!(!has_checksum("$PDWT,GETSTATE=LED"));
    assert_eq!(validate("$PDWT,GETSTATE=LED"), Ok("PDWT,GETSTATE=LED"));
}

#[test]
fn validation_rejects_unframed_lines() {
    assert_eq!(validate(""), Err(SentenceError::Empty));
    assert_eq!(
        validate("PDWT,GETSTATE=LED"),
        Err(SentenceError::InvalidStart)
    );
}

#[test]
fn encode_produces_a_validating_frame() {
    let mut out: heapless::String<{ MAX_SENTENCE_LENGTH + 5 }> = heapless::String::new();
    encode("PDWT,SETSTATE=BLINKINTERVAL:00007530", &mut out).unwrap();
    assert_eq!(out.as_str(), "$PDWT,SETSTATE=BLINKINTERVAL:00007530*75\n");

    let line = &out[..out.len() - 1];
    assert_eq!(validate(line), Ok("PDWT,SETSTATE=BLINKINTERVAL:00007530"));
}
