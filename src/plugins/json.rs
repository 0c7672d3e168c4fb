//! Canonical JSON: two-space indentation, `,` after items, `": "` between
//! key and value, keys sorted, trailing newline.
//!
//! The canonical text is produced from a full parse, so invalid JSON is
//! always reported rather than passed through. Numbers keep their parsed
//! token (`arbitrary_precision`), so integers of any size survive exactly:
//!
//! - integers are written as parsed, except `-0` which becomes `0`
//! - numbers with a fraction or exponent are written as the shortest
//!   decimal that round-trips through `f64`, `1e+16` style beyond 16 digits
//! - a fraction or exponent that overflows `f64` is malformed content
//!
//! Strings are ASCII-only in canonical form: anything outside `' '..='~'`
//! is written as a `\uXXXX` escape, with surrogate pairs above the BMP.

use crate::plugin::MalformedContent;
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};
use serde_json::{Map, Number, Value};
use std::io;

pub const NAME: &str = "json";
pub const EXTENSIONS: &[&str] = &["json"];

/// Re-serialize `content` in canonical form.
pub fn canonicalize(content: &str) -> Result<String, MalformedContent> {
    let value: Value = serde_json::from_str(content).map_err(malformed)?;
    let value = normalize(value)?;

    let mut out = Vec::with_capacity(content.len() + 1);
    let mut serializer = Serializer::with_formatter(&mut out, AsciiFormatter::default());
    value.serialize(&mut serializer).map_err(malformed)?;
    out.push(b'\n');

    String::from_utf8(out).map_err(|err| MalformedContent::new(err.to_string()))
}

fn malformed(err: serde_json::Error) -> MalformedContent {
    MalformedContent::new(err.to_string())
}

/// Sort object keys and rewrite every number into its canonical token.
fn normalize(value: Value) -> Result<Value, MalformedContent> {
    Ok(match value {
        Value::Number(number) => Value::Number(normalize_number(&number)?),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(normalize)
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => {
            // Insertion order must not leak through if the map preserves it
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, normalize(value)?);
            }
            Value::Object(sorted)
        }
        other => other,
    })
}

fn normalize_number(number: &Number) -> Result<Number, MalformedContent> {
    let token = number.to_string();
    let canonical = if token.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
        let float: f64 = token
            .parse()
            .map_err(|_| MalformedContent::new(format!("invalid number {token}")))?;
        if !float.is_finite() {
            return Err(MalformedContent::new(format!(
                "number {token} is out of range"
            )));
        }
        float_repr(float)
    } else if token == "-0" {
        "0".to_string()
    } else {
        token
    };

    canonical.parse().map_err(malformed)
}

/// Shortest round-trip decimal for `value`, always carrying a fraction or
/// an exponent so it reads back as a float.
fn float_repr(value: f64) -> String {
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    let body = if (-4..16).contains(&exponent) {
        if exponent >= 0 {
            let point = exponent as usize + 1;
            if digits.len() <= point {
                format!("{digits}{}.0", "0".repeat(point - digits.len()))
            } else {
                format!("{}.{}", &digits[..point], &digits[point..])
            }
        } else {
            format!("0.{}{digits}", "0".repeat((-exponent - 1) as usize))
        }
    } else {
        let mantissa = if digits.len() > 1 {
            format!("{}.{}", &digits[..1], &digits[1..])
        } else {
            digits
        };
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{exponent_sign}{:02}", exponent.abs())
    };

    format!("{sign}{body}")
}

/// Pretty layout with every non-printable or non-ASCII character escaped.
#[derive(Default)]
struct AsciiFormatter {
    pretty: PrettyFormatter<'static>,
}

impl Formatter for AsciiFormatter {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(fragment[start..index].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}
