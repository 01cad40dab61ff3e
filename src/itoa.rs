//! Rendering of scaled (×10) integers as one-fractional-digit decimals.

/// Append `scaled / 10` to `out` with exactly one fractional digit.
///
/// `-5` renders as `-0.5`, `0` as `0.0`, `123` as `12.3`.
pub fn write(out: &mut Vec<u8>, scaled: i64) {
    if scaled < 0 {
        out.push(b'-');
    }
    let abs = scaled.unsigned_abs();
    let int = abs / 10;
    let frac = (abs % 10) as u8;

    let mut digits = [0u8; 20];
    let mut at = digits.len();
    let mut rest = int;
    loop {
        at -= 1;
        digits[at] = b'0' + (rest % 10) as u8;
        rest /= 10;
        if rest == 0 {
            break;
        }
    }

    out.extend_from_slice(&digits[at..]);
    out.push(b'.');
    out.push(b'0' + frac);
}

pub fn format(scaled: i64) -> String {
    let mut out = Vec::with_capacity(8);
    write(&mut out, scaled);
    out.into_iter().map(char::from).collect()
}
