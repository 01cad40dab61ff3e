use std::io::{self, Write};

use crate::{
    data::{AggregationMap, Data},
    itoa,
};

/// Mean rounded half away from zero to one fractional digit, kept scaled.
///
/// `f64::round` already rounds half away from zero, and rounding the scaled
/// mean avoids the second rounding step of dividing by ten first.
fn rounded_mean(data: &Data) -> i64 {
    data.mean().round() as i64
}

/// `{key=min/mean/max, ...}` with keys in ascending byte order.
pub fn render(map: &AggregationMap) -> Vec<u8> {
    let mut rows: Vec<(&[u8], Data)> = map.iter().map(|(k, v)| (&**k, *v)).collect();
    glidesort::sort(&mut rows);

    let mut out = Vec::with_capacity(rows.len() * 32 + 2);
    out.push(b'{');
    for (i, (key, data)) in rows.iter().enumerate() {
        if i > 0 {
            out.extend_from_slice(b", ");
        }
        out.extend_from_slice(key);
        out.push(b'=');
        itoa::write(&mut out, data.min as i64);
        out.push(b'/');
        itoa::write(&mut out, rounded_mean(data));
        out.push(b'/');
        itoa::write(&mut out, data.max as i64);
    }
    out.push(b'}');
    out
}

/// Display helper over [`render`]. Key bytes that are not valid UTF-8 are
/// replaced with U+FFFD; use [`render`] or [`write_report`] to keep them
/// verbatim.
pub fn format_report(map: &AggregationMap) -> String {
    String::from_utf8_lossy(&render(map)).into_owned()
}

/// Write the report followed by a line break.
pub fn write_report<W: Write>(writer: &mut W, map: &AggregationMap) -> io::Result<()> {
    writer.write_all(&render(map))?;
    writer.write_all(b"\n")?;
    writer.flush()
}
