//! vCard codec
//!
//! Converts between a [`Contact`] and the vCard 3.0 files kept in the
//! address book directory. Only the properties the contact model knows
//! about are interpreted; every other content line is kept in
//! [`Contact::extra`] and written back unchanged. Groups and parameters on
//! mail, phone, URL and address lines ride along on the value.
//!
//! Single values are flattened to one line on decode, since the editable
//! document has one line per value. Notes keep their line breaks.

use crate::error::CodecError;
use crate::models::{Address, Contact, TypedValue};
use crate::template::patterns::is_text_kind;

/// Extension of card files in the address book directory
pub const FILE_EXTENSION: &str = "vcf";

/// Maximum line length in octets before folding
const FOLD_WIDTH: usize = 75;

/// One parameter of a content line
struct Param<'a> {
    /// Upper-cased name; bare vCard 2.1 parameters count as TYPE
    key: String,
    /// Value with quotes removed
    value: String,
    /// The segment as written, for parameters that are passed through
    raw: &'a str,
    bare: bool,
}

/// One unfolded content line, split into its parts
struct ContentLine<'a> {
    /// Group prefix as written, empty if there is none
    group: &'a str,
    /// Upper-cased property name without group prefix
    name: String,
    params: Vec<Param<'a>>,
    /// Raw value, still escaped
    value: &'a str,
}

impl ContentLine<'_> {
    /// TYPE values usable as kinds, lower-cased, and every parameter that
    /// is not a kind or one of `modelled`, verbatim
    fn kinds_and_params(&self, modelled: &[&str]) -> (Vec<String>, Vec<String>) {
        let mut kinds = Vec::new();
        let mut params = Vec::new();
        for param in &self.params {
            if param.key != "TYPE" {
                if !modelled.contains(&param.key.as_str()) {
                    params.push(param.raw.to_string());
                }
                continue;
            }
            for kind in param.value.split(',').map(str::trim).filter(|k| !k.is_empty()) {
                let lower = kind.to_lowercase();
                if is_text_kind(&lower) {
                    kinds.push(lower);
                } else if param.bare {
                    params.push(kind.to_string());
                } else {
                    params.push(format!("TYPE={}", kind));
                }
            }
        }
        (kinds, params)
    }

    fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }
}

/// Decode a single vCard into a contact
pub fn decode(bytes: &[u8]) -> Result<Contact, CodecError> {
    let text = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;

    let mut contact = Contact::default();
    let mut started = false;
    let mut finished = false;

    for (number, line) in unfold(text) {
        if line.trim().is_empty() {
            continue;
        }
        let parsed = parse_line(&line).ok_or_else(|| CodecError::MalformedLine {
            line: number,
            content: line.clone(),
        })?;

        if !started {
            if parsed.name == "BEGIN" && parsed.value.trim().eq_ignore_ascii_case("VCARD") {
                started = true;
                continue;
            }
            return Err(CodecError::MissingBegin);
        }

        match parsed.name.as_str() {
            "END" => {
                finished = true;
                break;
            }
            "BEGIN" => {
                return Err(CodecError::MalformedLine {
                    line: number,
                    content: line.clone(),
                })
            }
            "VERSION" => {}
            "UID" => contact.uid = unescape(parsed.value).trim().to_string(),
            "REV" => contact.revision = optional(parsed.value),
            "FN" => contact.formatted_name = optional(parsed.value),
            "N" => {
                let mut parts = split_unescaped(parsed.value, ';').into_iter().map(text_list);
                contact.name.family = parts.next().unwrap_or_default();
                contact.name.given = parts.next().unwrap_or_default();
                contact.name.additional = parts.next().unwrap_or_default();
                contact.name.prefixes = parts.next().unwrap_or_default();
                contact.name.suffixes = parts.next().unwrap_or_default();
            }
            "NICKNAME" => contact.nicknames.extend(text_list(parsed.value)),
            "TITLE" => contact.title = optional(parsed.value),
            "ROLE" => contact.role = optional(parsed.value),
            "ORG" => {
                let units: Vec<String> = split_unescaped(parsed.value, ';')
                    .into_iter()
                    .map(|unit| one_line(&unescape(unit)))
                    .collect();
                let joined = units
                    .iter()
                    .filter(|unit| !unit.is_empty())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ");
                contact.organization = if joined.is_empty() { None } else { Some(joined) };
                contact.organization_units = units;
            }
            "CATEGORIES" => contact.categories.extend(text_list(parsed.value)),
            "BDAY" => contact.birthday = optional(parsed.value),
            "EMAIL" => contact.emails.push(typed_value(&parsed)),
            "TEL" => contact.phones.push(typed_value(&parsed)),
            "URL" => contact.urls.push(typed_value(&parsed)),
            "ADR" => contact.addresses.push(address(&parsed)),
            "NOTE" => {
                let note = unescape(parsed.value);
                contact.note = Some(match contact.note.take() {
                    Some(previous) => format!("{}\n{}", previous, note),
                    None => note,
                });
            }
            _ => contact.extra.push(line.clone()),
        }
    }

    if !started {
        return Err(CodecError::MissingBegin);
    }
    if !finished {
        return Err(CodecError::MissingEnd);
    }
    Ok(contact)
}

/// Encode a contact as a vCard 3.0
pub fn encode(contact: &Contact) -> Vec<u8> {
    let mut lines: Vec<String> = vec!["BEGIN:VCARD".to_string(), "VERSION:3.0".to_string()];

    if !contact.uid.is_empty() {
        lines.push(format!("UID:{}", escape(&contact.uid)));
    }
    if let Some(rev) = &contact.revision {
        lines.push(format!("REV:{}", escape(rev)));
    }
    lines.push(format!("FN:{}", escape(&contact.display_name())));
    lines.push(format!(
        "N:{};{};{};{};{}",
        join_list(&contact.name.family),
        join_list(&contact.name.given),
        join_list(&contact.name.additional),
        join_list(&contact.name.prefixes),
        join_list(&contact.name.suffixes),
    ));
    if !contact.nicknames.is_empty() {
        lines.push(format!("NICKNAME:{}", join_list(&contact.nicknames)));
    }
    push_text(&mut lines, "TITLE", contact.title.as_deref());
    push_text(&mut lines, "ROLE", contact.role.as_deref());
    if let Some(org) = organization_value(contact) {
        lines.push(format!("ORG:{}", org));
    }
    if !contact.categories.is_empty() {
        lines.push(format!("CATEGORIES:{}", join_list(&contact.categories)));
    }
    push_text(&mut lines, "BDAY", contact.birthday.as_deref());

    for (name, values) in [
        ("EMAIL", &contact.emails),
        ("TEL", &contact.phones),
        ("URL", &contact.urls),
    ] {
        for value in values {
            lines.push(format!(
                "{}{}{}{}:{}",
                group_prefix(&value.group),
                name,
                type_param(&value.kinds),
                extra_params(&value.params),
                escape(&value.value)
            ));
        }
    }

    for adr in &contact.addresses {
        let mut line = format!("{}ADR{}", group_prefix(&adr.group), type_param(&adr.kinds));
        if !adr.label.is_empty() {
            line.push_str(&format!(
                ";LABEL=\"{}\"",
                escape(&adr.label).replace('"', "'")
            ));
        }
        line.push_str(&extra_params(&adr.params));
        line.push_str(&format!(
            ":{};{};{};{};{};{};{}",
            escape(&adr.post_office_box),
            escape(&adr.extended_address),
            escape(&adr.street),
            escape(&adr.locality),
            escape(&adr.region),
            escape(&adr.postal_code),
            escape(&adr.country),
        ));
        lines.push(line);
    }

    push_text(&mut lines, "NOTE", contact.note.as_deref());
    lines.extend(contact.extra.iter().cloned());
    lines.push("END:VCARD".to_string());

    let mut out = String::new();
    for line in &lines {
        out.push_str(&fold(line));
        out.push_str("\r\n");
    }
    out.into_bytes()
}

/// Join folded lines, returning each logical line with its 1-based start line
fn unfold(text: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();
    for (index, raw) in text.split('\n').enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(rest) = raw.strip_prefix([' ', '\t']) {
            if let Some((_, last)) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        lines.push((index + 1, raw.to_string()));
    }
    lines
}

/// Split a content line into name, parameters and raw value
fn parse_line(line: &str) -> Option<ContentLine<'_>> {
    let colon = find_outside_quotes(line, ':')?;
    let (head, value) = (&line[..colon], &line[colon + 1..]);

    let mut segments = split_outside_quotes(head, ';').into_iter();
    let first = segments.next()?;
    let (group, name) = match first.rsplit_once('.') {
        Some((group, name)) => (group.trim(), name.trim()),
        None => ("", first.trim()),
    };
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return None;
    }

    let params = segments
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) => Param {
                key: key.trim().to_uppercase(),
                value: value.replace('"', ""),
                raw: segment,
                bare: false,
            },
            // vCard 2.1 style bare parameter, e.g. TEL;HOME;VOICE
            None => Param {
                key: "TYPE".to_string(),
                value: segment.to_string(),
                raw: segment,
                bare: true,
            },
        })
        .collect();

    Some(ContentLine {
        group,
        name: name.to_uppercase(),
        params,
        value,
    })
}

fn find_outside_quotes(s: &str, needle: char) -> Option<usize> {
    let mut quoted = false;
    for (index, c) in s.char_indices() {
        match c {
            '"' => quoted = !quoted,
            c if c == needle && !quoted => return Some(index),
            _ => {}
        }
    }
    None
}

fn split_outside_quotes(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(index) = find_outside_quotes(rest, sep) {
        parts.push(&rest[..index]);
        rest = &rest[index + sep.len_utf8()..];
    }
    parts.push(rest);
    parts
}

/// Split a raw value on separators that are not backslash-escaped
fn split_unescaped(value: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (index, c) in value.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == sep {
            parts.push(&value[start..index]);
            start = index + c.len_utf8();
        }
    }
    parts.push(&value[start..]);
    parts
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            other => out.push(other),
        }
    }
    out
}

/// Join the lines of a value with single spaces
fn one_line(value: &str) -> String {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn optional(value: &str) -> Option<String> {
    let value = one_line(&unescape(value));
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Comma separated text list, empty entries dropped
fn text_list(value: &str) -> Vec<String> {
    split_unescaped(value, ',')
        .into_iter()
        .map(|item| one_line(&unescape(item)))
        .filter(|item| !item.is_empty())
        .collect()
}

fn join_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| escape(v))
        .collect::<Vec<_>>()
        .join(",")
}

fn typed_value(line: &ContentLine<'_>) -> TypedValue {
    let (kinds, params) = line.kinds_and_params(&[]);
    TypedValue {
        kinds,
        value: one_line(&unescape(line.value)),
        group: line.group.to_string(),
        params,
    }
}

fn address(line: &ContentLine<'_>) -> Address {
    let (kinds, params) = line.kinds_and_params(&["LABEL"]);
    let mut parts = split_unescaped(line.value, ';')
        .into_iter()
        .map(|part| one_line(&unescape(part)));
    let mut next = || parts.next().unwrap_or_default();
    Address {
        kinds,
        group: line.group.to_string(),
        params,
        label: line.param("LABEL").map(unescape).unwrap_or_default(),
        post_office_box: next(),
        extended_address: next(),
        street: next(),
        locality: next(),
        region: next(),
        postal_code: next(),
        country: next(),
    }
}

fn type_param(kinds: &[String]) -> String {
    let kinds: Vec<&str> = kinds
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();
    if kinds.is_empty() {
        String::new()
    } else {
        format!(";TYPE={}", kinds.join(","))
    }
}

fn extra_params(params: &[String]) -> String {
    params.iter().map(|p| format!(";{}", p)).collect()
}

fn group_prefix(group: &str) -> String {
    if group.is_empty() {
        String::new()
    } else {
        format!("{}.", group)
    }
}

/// ORG value, keeping the stored units while the display form is unchanged
fn organization_value(contact: &Contact) -> Option<String> {
    let organization = contact.organization.as_deref().filter(|o| !o.is_empty())?;
    let joined = contact
        .organization_units
        .iter()
        .filter(|unit| !unit.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if joined == organization {
        Some(
            contact
                .organization_units
                .iter()
                .map(|unit| escape(unit))
                .collect::<Vec<_>>()
                .join(";"),
        )
    } else {
        Some(escape(organization))
    }
}

fn push_text(lines: &mut Vec<String>, name: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        lines.push(format!("{}:{}", name, escape(value)));
    }
}

/// Fold a logical line into physical lines of at most 75 octets
fn fold(line: &str) -> String {
    if line.len() <= FOLD_WIDTH {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + line.len() / FOLD_WIDTH * 3);
    let mut width = 0;
    // continuation lines carry a leading space
    let mut limit = FOLD_WIDTH;
    for c in line.chars() {
        if width + c.len_utf8() > limit {
            out.push_str("\r\n ");
            width = 0;
            limit = FOLD_WIDTH - 1;
        }
        out.push(c);
        width += c.len_utf8();
    }
    out
}
