// DMI descriptor grammar: line-oriented `key = value` entries with tab
// indented attribute blocks

use crate::error::{DmiError, DmiResult};
use crate::model::{Descriptor, StateDeclaration, Value};

pub const DMI_BEGIN: &str = "# BEGIN DMI";
pub const DMI_END: &str = "# END DMI";
pub const OUTPUT_VERSION: &str = "4.0";
pub const OUTPUT_ICON_SIZE: u32 = 32;

const KNOWN_STATE_KEYS: [&str; 4] = ["state", "dirs", "frames", "delay"];

#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorLine {
    pub raw: String,
    /// Tab indented lines are attributes of the closest entry above them.
    pub continuation: bool,
    /// Blank and `#` lines hold no data but still end an attribute block.
    pub separator: bool,
    pub key: String,
    pub value: Value,
}

/// A top-level entry merged with its attribute block.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub header: String,
    pub fields: Vec<(String, Value)>,
}

impl Entry {
    fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            fields: Vec::new(),
        }
    }

    /// Later duplicates overwrite the earlier value but keep its position.
    fn insert(&mut self, key: String, value: Value) {
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// A strictly positive integer attribute such as `dirs` or `frames`.
    pub fn require_count(&self, attribute: &str) -> DmiResult<u32> {
        let value = self
            .get(attribute)
            .ok_or_else(|| DmiError::missing(&self.header, attribute))?;

        value
            .as_int()
            .filter(|n| *n > 0)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                DmiError::malformed(format!(
                    "`{}` of `{}` must be a positive integer, got `{}`",
                    attribute, self.header, value
                ))
            })
    }
}

pub fn parse_line(raw: &str) -> DmiResult<(String, Value)> {
    let (key, value) = match raw.split_once(" = ") {
        Some(kv) => kv,
        None => match raw.strip_suffix(" =") {
            Some(key) => (key, ""),
            None => {
                return Err(DmiError::malformed(format!(
                    "expected `key = value`, got `{}`",
                    raw
                )));
            }
        },
    };

    let key = key.replace('\t', "");
    let key = key.trim();
    if key.is_empty() {
        return Err(DmiError::malformed(format!("missing key in `{}`", raw)));
    }

    Ok((key.to_string(), Value::coerce(value)))
}

/// Splits descriptor text into structured lines. Blank lines and `#`
/// comments (including the BEGIN/END markers) are kept as separators.
pub fn parse_lines(text: &str) -> DmiResult<Vec<DescriptorLine>> {
    let mut lines = Vec::new();

    for raw in text.lines() {
        if raw.trim().is_empty() || raw.trim_start().starts_with('#') {
            lines.push(DescriptorLine {
                raw: raw.to_string(),
                continuation: false,
                separator: true,
                key: String::new(),
                value: Value::Raw(String::new()),
            });
            continue;
        }

        let (key, value) = parse_line(raw)?;
        lines.push(DescriptorLine {
            raw: raw.to_string(),
            continuation: raw.starts_with('\t'),
            separator: false,
            key,
            value,
        });
    }

    Ok(lines)
}

/// Finds the first top-level line starting with `key_prefix` and merges it
/// with the contiguous run of indented lines that follows.
pub fn find_entry(lines: &[DescriptorLine], key_prefix: &str) -> Option<Entry> {
    let start = lines
        .iter()
        .position(|l| !l.continuation && !l.separator && l.raw.starts_with(key_prefix))?;

    let head = &lines[start];
    let mut entry = Entry::new(head.raw.clone());
    entry.insert(head.key.clone(), head.value.clone());

    for line in lines[start + 1..].iter().take_while(|l| l.continuation) {
        entry.insert(line.key.clone(), line.value.clone());
    }

    Some(entry)
}

pub fn state_prefix(name: &str) -> String {
    format!("state = \"{}\"", name)
}

/// Every declared state name in order, duplicates included.
pub fn list_state_names(lines: &[DescriptorLine]) -> Vec<String> {
    lines
        .iter()
        .filter(|l| !l.continuation && !l.separator && l.raw.starts_with("state"))
        .map(|l| l.value.to_string())
        .collect()
}

fn find_state_entry(lines: &[DescriptorLine], name: &str) -> DmiResult<Entry> {
    let prefix = state_prefix(name);
    find_entry(lines, &prefix)
        .ok_or_else(|| DmiError::malformed(format!("no entry found for `{}`", prefix)))
}

/// Sum of `dirs * frames` over every declared state, recounted from the lines.
pub fn total_frame_count(lines: &[DescriptorLine]) -> DmiResult<usize> {
    let mut total = 0;
    for name in list_state_names(lines) {
        let entry = find_state_entry(lines, &name)?;
        total += entry.require_count("dirs")? as usize * entry.require_count("frames")? as usize;
    }
    Ok(total)
}

pub fn descriptor_from_lines(lines: &[DescriptorLine]) -> DmiResult<Descriptor> {
    let header = find_entry(lines, "version")
        .ok_or_else(|| DmiError::malformed("no `version` entry"))?;

    let version = header
        .get("version")
        .cloned()
        .ok_or_else(|| DmiError::missing(&header.header, "version"))?;
    let width = header.require_count("width")?;
    let height = header.require_count("height")?;

    let mut states = Vec::new();
    for name in list_state_names(lines) {
        let entry = find_state_entry(lines, &name)?;

        let mut state = StateDeclaration::new(
            name,
            entry.require_count("dirs")?,
            entry.require_count("frames")?,
        );
        state.delay = entry.get("delay").cloned();
        state.extra = entry
            .fields
            .iter()
            .filter(|(k, _)| !KNOWN_STATE_KEYS.contains(&k.as_str()))
            .cloned()
            .collect();

        states.push(state);
    }

    Ok(Descriptor {
        version,
        width,
        height,
        states,
    })
}

pub fn parse(text: &str) -> DmiResult<Descriptor> {
    let lines = parse_lines(text)?;
    descriptor_from_lines(&lines)
}

pub fn serialize(descriptor: &Descriptor) -> String {
    serialize_with(descriptor, false)
}

/// Writes the descriptor back out. The header is always `version = 4.0`
/// with a 32x32 icon size regardless of what was parsed.
pub fn serialize_with(descriptor: &Descriptor, preserve_extra_attributes: bool) -> String {
    let mut desc = String::new();
    desc.push_str(DMI_BEGIN);
    desc.push('\n');
    desc.push_str(&format!(
        "version = {}\n\twidth = {}\n\theight = {}\n",
        OUTPUT_VERSION, OUTPUT_ICON_SIZE, OUTPUT_ICON_SIZE
    ));

    for state in &descriptor.states {
        desc.push_str(&format!(
            "state = \"{}\"\n\tdirs = {}\n\tframes = {}\n",
            state.name, state.dirs, state.frames
        ));
        if let Some(delay) = &state.delay {
            desc.push_str(&format!("\tdelay = {}\n", delay));
        }
        if preserve_extra_attributes {
            for (key, value) in &state.extra {
                desc.push_str(&format!("\t{} = {}\n", key, value));
            }
        }
    }

    desc.push_str(DMI_END);
    desc
}
