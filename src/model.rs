//! Catalog response objects and the decoders that build them from JSON.
//!
//! Decoding works on [`serde_json::Value`] rather than derived `Deserialize`
//! impls so that a missing field can be reported by its JSON path.
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Image format substituted into artwork URL templates.
const IMAGE_FORMAT: &str = "png";

/// Artist label used when a resource carries no `artistName`.
pub const DEFAULT_ARTIST_NAME: &str = " ";

pub type StorefrontId = String;

/// Groups up the kinds of errors that may happen while decoding a resource.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("missing field `{0}`")]
    Missing(String),

    #[error("unknown resource type `{0}`")]
    UnknownKind(String),
}

impl ModelError {
    fn missing(field: &str) -> Self {
        Self::Missing(field.to_owned())
    }

    /// Prefix the reported field with the path of the object it was read from.
    fn within(self, parent: &str) -> Self {
        match self {
            Self::Missing(field) => Self::Missing(format!("{parent}.{field}")),
            Self::UnknownKind(kind) => Self::UnknownKind(kind),
        }
    }
}

/// Resource type, as named by the `type` field of a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Songs,
    Albums,
    Stations,
    Playlists,
}

impl MediaKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Songs => "songs",
            Self::Albums => "albums",
            Self::Stations => "stations",
            Self::Playlists => "playlists",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "songs" => Some(Self::Songs),
            "albums" => Some(Self::Albums),
            "stations" => Some(Self::Stations),
            "playlists" => Some(Self::Playlists),
            _ => None,
        }
    }
}

/// Artwork object
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Artwork {
    /// The maximum height available for the image.
    pub height: u32,
    /// The maximum width available for the image.
    pub width: u32,
    /// URL with `{w}`, `{h}` and `{f}` placeholders for width, height and format.
    pub url_template: String,
}

impl Artwork {
    /// Fill the URL template in for an image of the given size.
    ///
    /// The template is not validated, a malformed template yields a malformed URL.
    pub fn image_url(&self, width: u32, height: u32) -> String {
        self.url_template
            .replace("{w}", &width.to_string())
            .replace("{h}", &height.to_string())
            .replace("{f}", IMAGE_FORMAT)
    }

    /// URL of the largest image the catalog has.
    pub fn max_size_url(&self) -> String {
        self.image_url(self.width, self.height)
    }
}

/// A song, album, station or playlist returned by a catalog search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MediaItem {
    /// Catalog identifier, unique within a response.
    pub id: String,
    /// Localized name of the song or album.
    pub name: String,
    pub artist_name: String,
    pub artwork: Artwork,
    pub kind: MediaKind,
}

/// The result buckets a search response may carry, in presentation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketKind {
    Songs,
    Albums,
}

impl BucketKind {
    pub const ALL: [Self; 2] = [Self::Songs, Self::Albums];

    /// Key of the bucket inside the response `results` object.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Songs => "songs",
            Self::Albums => "albums",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub kind: BucketKind,
    pub items: Vec<MediaItem>,
}

/// A resource that could not be decoded, located by bucket and position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub bucket: BucketKind,
    pub index: usize,
    #[serde(serialize_with = "serialize_display")]
    pub error: ModelError,
}

/// Decoded search response. Items that failed to decode are listed in
/// `failures` and left out of their bucket; their siblings are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchResultSet {
    pub buckets: Vec<Bucket>,
    pub failures: Vec<ItemFailure>,
}

impl SearchResultSet {
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|bucket| bucket.items.is_empty())
    }

    pub fn item_count(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.items.len()).sum()
    }

    pub fn bucket(&self, kind: BucketKind) -> Option<&Bucket> {
        self.buckets.iter().find(|bucket| bucket.kind == kind)
    }

    /// Whether some resources in the response were dropped.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

fn serialize_display<T, S>(value: &T, s: S) -> Result<S::Ok, S::Error>
where
    T: fmt::Display,
    S: Serializer,
{
    s.collect_str(value)
}

fn str_field<'a>(json: &'a Value, key: &str) -> Result<&'a str, ModelError> {
    json.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ModelError::missing(key))
}

fn u32_field(json: &Value, key: &str) -> Result<u32, ModelError> {
    json.get(key)
        .and_then(Value::as_u64)
        .and_then(|value| u32::try_from(value).ok())
        .ok_or_else(|| ModelError::missing(key))
}

fn object_field<'a>(json: &'a Value, key: &str) -> Result<&'a Value, ModelError> {
    json.get(key)
        .filter(|value| value.is_object())
        .ok_or_else(|| ModelError::missing(key))
}

/// Decode an artwork object. Reported field names are relative to the artwork.
pub fn decode_artwork(json: &Value) -> Result<Artwork, ModelError> {
    Ok(Artwork {
        height: u32_field(json, "height")?,
        width: u32_field(json, "width")?,
        url_template: str_field(json, "url")?.to_owned(),
    })
}

/// Decode a single catalog resource.
pub fn decode_item(json: &Value) -> Result<MediaItem, ModelError> {
    let id = str_field(json, "id")?;
    let raw_kind = str_field(json, "type")?;
    let kind =
        MediaKind::parse(raw_kind).ok_or_else(|| ModelError::UnknownKind(raw_kind.to_owned()))?;
    let attributes = object_field(json, "attributes")?;
    let name = str_field(attributes, "name").map_err(|err| err.within("attributes"))?;
    let artist_name = attributes
        .get("artistName")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_ARTIST_NAME);
    let artwork = object_field(attributes, "artwork")
        .map_err(|err| err.within("attributes"))
        .and_then(|artwork| {
            decode_artwork(artwork).map_err(|err| err.within("attributes.artwork"))
        })?;

    Ok(MediaItem {
        id: id.to_owned(),
        name: name.to_owned(),
        artist_name: artist_name.to_owned(),
        artwork,
        kind,
    })
}

/// Decode the body of a catalog search response.
///
/// Only the `songs` and `albums` buckets are read, always in that order.
/// A bucket without a `data` array is skipped.
pub fn decode_search_results(json: &Value) -> Result<SearchResultSet, ModelError> {
    let results = object_field(json, "results")?;
    let mut set = SearchResultSet::default();

    for kind in BucketKind::ALL {
        let Some(resources) = results
            .get(kind.key())
            .and_then(|bucket| bucket.get("data"))
            .and_then(Value::as_array)
        else {
            continue;
        };

        let mut items = Vec::with_capacity(resources.len());
        for (index, resource) in resources.iter().enumerate() {
            match decode_item(resource) {
                Ok(item) => items.push(item),
                Err(error) => set.failures.push(ItemFailure {
                    bucket: kind,
                    index,
                    error,
                }),
            }
        }
        set.buckets.push(Bucket { kind, items });
    }

    Ok(set)
}

/// Read the storefront identifier from the first element of a `data` array.
pub fn decode_storefront(json: &Value) -> Result<StorefrontId, ModelError> {
    let data = json
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ModelError::missing("data"))?;
    data.first()
        .and_then(|storefront| storefront.get("id"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| ModelError::missing("data[0].id"))
}
