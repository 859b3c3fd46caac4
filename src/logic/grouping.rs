//! Grouping keys for inventory item instances.
//!
//! Two instances whose keys are equal describe the same configuration of the
//! same furniture item and are stored as a single row with a summed `count`.
//! Keys are persisted alongside rows and compared with keys computed by other
//! clients, so the layout below is a stable format: component order,
//! delimiters and hash arithmetic must not change.
//!
//! Free text may contain the delimiters themselves, so `\`, `|` and (inside
//! list entries) `,` are backslash-escaped within a component. Text without
//! those characters renders verbatim.

use itertools::Itertools;
use std::borrow::Cow;
use std::cmp::Ordering;

use crate::error::IdentityError;
use crate::model::{InventoryItemInstance, PackingNeed, RecordId};

/// Separates the top-level key components
pub const FIELD_DELIMITER: &str = "|";
/// Separates entries inside the tags and packing-needs components
pub const LIST_SEPARATOR: &str = ",";
/// Separates the uploaded-images hash from the camera-images hash
pub const IMAGE_HASH_SEPARATOR: &str = "_";

const ESCAPE: char = '\\';

/// Backslash-escape the escape character, the field delimiter and `reserved`
fn escape<'t>(text: &'t str, reserved: &[char]) -> Cow<'t, str> {
    let needs_escape = |c: char| c == ESCAPE || c == '|' || reserved.contains(&c);
    if !text.contains(needs_escape) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 4);
    for c in text.chars() {
        if needs_escape(c) {
            escaped.push(ESCAPE);
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}

fn escape_field(text: &str) -> Cow<'_, str> {
    escape(text, &[])
}

fn escape_entry(text: &str) -> Cow<'_, str> {
    escape(text, &[','])
}

/// Order strings by UTF-16 code units, the order the web client sorts in
fn cmp_utf16(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

/// 32-bit polynomial rolling hash (`acc * 31 + unit`) with two's-complement wraparound.
///
/// Characters are consumed as UTF-16 code units so keys match those produced
/// by the web client; for text inside the Basic Multilingual Plane this is the
/// same as hashing code points.
pub fn rolling_hash32(text: &str) -> i32 {
    hash_units(text.encode_utf16())
}

/// Hash of the concatenation of `parts`, without building the concatenated string
fn hash_concat(parts: &[String]) -> i32 {
    hash_units(parts.iter().flat_map(|part| part.encode_utf16()))
}

fn hash_units(units: impl Iterator<Item = u16>) -> i32 {
    units.fold(0i32, |acc, unit| {
        acc.wrapping_mul(31).wrapping_add(i32::from(unit))
    })
}

/// Key inputs with every optional field resolved to its neutral value
struct GroupingFields<'a> {
    base_id: &'a RecordId,
    room_id: Option<&'a RecordId>,
    tags: &'a [String],
    notes: &'a str,
    cuft: &'a str,
    lbs: &'a str,
    packing_needs: &'a [PackingNeed],
    link: &'a str,
    uploaded_images: &'a [String],
    camera_images: &'a [String],
}

impl<'a> GroupingFields<'a> {
    fn resolve(instance: &'a InventoryItemInstance) -> Result<Self, IdentityError> {
        Ok(Self {
            base_id: GroupingKeyComputer::base_id(instance)?,
            room_id: instance.room_id.as_ref(),
            tags: &instance.tags,
            notes: instance.notes.as_deref().unwrap_or_default(),
            cuft: instance.cuft.as_deref().unwrap_or_default(),
            lbs: instance.lbs.as_deref().unwrap_or_default(),
            packing_needs: &instance.packing_needs,
            link: instance.link.as_deref().unwrap_or_default(),
            uploaded_images: &instance.uploaded_images,
            camera_images: &instance.camera_images,
        })
    }

    fn room_key(&self) -> String {
        self.room_id
            .map(|room| escape_field(&room.to_string()).into_owned())
            .unwrap_or_default()
    }

    fn tags_key(&self) -> String {
        self.tags
            .iter()
            .sorted_by(|a, b| cmp_utf16(a, b))
            .map(|tag| escape_entry(tag))
            .join(LIST_SEPARATOR)
    }

    fn packing_needs_key(&self) -> String {
        self.packing_needs
            .iter()
            .sorted_by(|a, b| {
                cmp_utf16(&a.kind, &b.kind)
                    .then_with(|| {
                        let (x, y) = (a.quantity.as_f64(), b.quantity.as_f64());
                        x.partial_cmp(&y).unwrap_or(Ordering::Equal)
                    })
                    .then_with(|| a.quantity_text().cmp(&b.quantity_text()))
            })
            .map(|need| format!("{}:{}", escape_entry(&need.kind), need.quantity_text()))
            .join(LIST_SEPARATOR)
    }

    fn images_key(&self) -> String {
        format!(
            "{}{}{}",
            hash_concat(self.uploaded_images),
            IMAGE_HASH_SEPARATOR,
            hash_concat(self.camera_images)
        )
    }

    fn into_key(self) -> String {
        [
            escape_field(&self.base_id.to_string()).into_owned(),
            self.room_key(),
            self.tags_key(),
            escape_field(self.notes).into_owned(),
            escape_field(self.cuft).into_owned(),
            escape_field(self.lbs).into_owned(),
            self.packing_needs_key(),
            escape_field(self.link).into_owned(),
            self.images_key(),
        ]
        .join(FIELD_DELIMITER)
    }
}

/// Computes grouping keys. Pure: no I/O, no logging, no shared state.
pub struct GroupingKeyComputer;

impl GroupingKeyComputer {
    /// Derive the grouping key of `instance`
    pub fn compute(instance: &InventoryItemInstance) -> Result<String, IdentityError> {
        Ok(GroupingFields::resolve(instance)?.into_key())
    }

    /// `furnitureItemId`, falling back to `id`. Empty text ids count as absent.
    pub fn base_id(instance: &InventoryItemInstance) -> Result<&RecordId, IdentityError> {
        instance
            .furniture_item_id
            .as_ref()
            .filter(|id| !id.is_blank())
            .or_else(|| instance.id.as_ref().filter(|id| !id.is_blank()))
            .ok_or(IdentityError)
    }

    /// True when both instances currently compute to the same key
    pub fn is_mergeable(
        a: &InventoryItemInstance,
        b: &InventoryItemInstance,
    ) -> Result<bool, IdentityError> {
        Ok(Self::compute(a)? == Self::compute(b)?)
    }
}

pub fn compute_grouping_key(instance: &InventoryItemInstance) -> Result<String, IdentityError> {
    GroupingKeyComputer::compute(instance)
}
