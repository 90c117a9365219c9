use obelisk_archive::{GameObject, LoadedSave};
use obelisk_properties::{Property, PropertySlice as _, PropertyValue};

use crate::error::ExtractError;


/// One line of a tribe's activity log.
///
/// Raw lines look like `Day 805, 17:03:22: <RichColor Color="1,0,0,1">Tribemember
/// Ada - Lvl 80 was killed!</>`; the parsed entry splits out the day and
/// time and keeps both the raw body and a tag-stripped copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TribeLogEntry {
    pub day:  u32,
    /// `HH:MM:SS` as written; not validated beyond position.
    pub time: String,
    /// The body with markup intact.
    pub message: String,
    /// The body with every `<RichColor …>…</>` wrapper reduced to its text.
    pub clean_message: String,
}

impl TribeLogEntry {
    /// Parse one log line. Lines outside the `Day D, HH:MM:SS: body` shape
    /// keep their full text as the message, with day zero.
    pub fn parse(raw: &str) -> Self {
        if let Some((day, time, body)) = split_log_line(raw) {
            Self {
                day,
                time: time.to_owned(),
                message: body.to_owned(),
                clean_message: strip_rich_color(body),
            }
        } else {
            Self {
                day:  0,
                time: String::new(),
                message: raw.to_owned(),
                clean_message: strip_rich_color(raw),
            }
        }
    }
}

fn split_log_line(raw: &str) -> Option<(u32, &str, &str)> {
    let rest = raw.strip_prefix("Day ")?;
    let (day, rest) = rest.split_once(", ")?;
    let day = day.trim().parse().ok()?;
    let (time, body) = rest.split_once(": ")?;
    Some((day, time, body))
}

/// Remove `<RichColor …>text</>` wrappers, keeping the wrapped text.
/// Unterminated markup degrades to keeping everything after the tag.
pub fn strip_rich_color(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("<RichColor") {
        out.push_str(&rest[.. start]);
        let after_tag = &rest[start ..];
        let Some(close) = after_tag.find('>') else {
            out.push_str(after_tag);
            return out;
        };
        let inner = &after_tag[close + 1 ..];
        match inner.find("</>") {
            Some(end) => {
                out.push_str(&inner[.. end]);
                rest = &inner[end + 3 ..];
            }
            None => {
                out.push_str(inner);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// A tribe snapshot: identity, membership, and the activity log.
#[derive(Debug, Clone)]
pub struct Tribe {
    pub tribe_id:   i32,
    pub tribe_name: String,
    pub owner_player_id: Option<u32>,
    pub member_names: Vec<String>,
    pub member_ids:   Vec<u32>,
    pub admin_ids:    Vec<u32>,
    pub logs: Vec<TribeLogEntry>,
}

impl Tribe {
    pub fn member_count(&self) -> usize {
        self.member_names.len()
    }

    /// Project a tribe from its data object. Tribe fields usually sit in a
    /// nested `TribeData` struct; very old snapshots inline them.
    pub fn from_object(object: &GameObject) -> Result<Self, ExtractError> {
        let props = object.properties.as_slice();
        let data = match props.find("TribeData") {
            Some(property) => property
                .as_fields()
                .ok_or(ExtractError::Shape("TribeData"))?,
            None => props,
        };

        Ok(Self {
            tribe_id: data
                .find("TribeID")
                .or_else(|| data.find("TribeId"))
                .and_then(Property::as_i32)
                .unwrap_or(0),
            tribe_name: data
                .find("TribeName")
                .and_then(Property::as_str)
                .unwrap_or_default()
                .to_owned(),
            owner_player_id: data.find("OwnerPlayerDataID").and_then(Property::as_u32),
            member_names: string_array(data, "MembersPlayerName"),
            member_ids:   u32_array(data, "MembersPlayerDataID"),
            admin_ids:    u32_array(data, "TribeAdmins"),
            logs: string_array(data, "TribeLog")
                .iter()
                .map(|line| TribeLogEntry::parse(line))
                .collect(),
        })
    }

    /// The tribe a `.arktribe` bundle describes.
    pub fn from_save(save: &LoadedSave) -> Result<Self, ExtractError> {
        save.container
            .iter()
            .find(|o| o.class_name.contains("PrimalTribeData"))
            .ok_or(ExtractError::MissingObject("PrimalTribeData"))
            .and_then(Self::from_object)
    }
}

fn string_array(props: &[Property], name: &str) -> Vec<String> {
    props
        .find(name)
        .and_then(Property::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|value| match value {
                    PropertyValue::Str(s) => Some(s.clone()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn u32_array(props: &[Property], name: &str) -> Vec<u32> {
    props
        .find(name)
        .and_then(Property::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|value| match value {
                    PropertyValue::UInt32(v) => Some(*v),
                    PropertyValue::Int(v)    => u32::try_from(*v).ok(),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
