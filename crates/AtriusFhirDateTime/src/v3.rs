//! HL7 V3 / CDA compact timestamps.
//!
//! V3 writes timestamps without punctuation, e.g. `20130202201303-0500`.
//! This module rewrites them into the FHIR `dateTime` syntax
//! (`2013-02-02T20:13:03-05:00`) so the normal parser can take over.

/// Rewrites a compact V3 timestamp into FHIR syntax.
///
/// Returns `None` for blank input. The output is not validated here; malformed
/// input comes out malformed and is rejected by the FHIR parser.
pub fn to_fhir_syntax(v3: &str) -> Option<String> {
    if v3.trim().is_empty() {
        return None;
    }

    let mut b = String::with_capacity(v3.len() + 6);
    let mut time_zone: Option<&str> = None;
    for (i, next) in v3.char_indices() {
        if matches!(next, '+' | '-' | 'Z') {
            time_zone = Some(&v3[i..]);
            break;
        }

        match i {
            4 | 6 => b.push('-'),
            8 => b.push('T'),
            10 | 12 => b.push(':'),
            _ => {}
        }
        b.push(next);
    }

    // Seconds are mandatory once a time is present
    if b.len() == 16 {
        b.push_str(":00");
    }

    if let Some(tz) = time_zone {
        if b.len() > 10 {
            if tz.len() == 5 && tz.is_char_boundary(3) {
                b.push_str(&tz[..3]);
                b.push(':');
                b.push_str(&tz[3..]);
            } else {
                b.push_str(tz);
            }
        }
    }

    Some(b)
}
