// Copyright (c) 2025 - Cowboy AI, Inc.
//! Domain entities mirrored from the survey server
//!
//! Every entity carries a stable opaque identifier. The store keys all
//! collections by these identifiers, never by position in a response array.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identifier of an astronomical object / source (e.g. `"ZTF20aaelulu"`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjId(String);

impl ObjId {
    /// Wrap a raw identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub i64);

/// Identifier of a photometry point
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotometryId(pub i64);

/// Identifier of a spectrum
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpectrumId(pub i64);

/// A source as returned by `GET /api/sources/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Object identifier
    pub id: ObjId,
    /// Right ascension (degrees)
    pub ra: f64,
    /// Declination (degrees)
    pub dec: f64,
    /// Redshift, when measured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redshift: Option<f64>,
    /// Server-side modification time, used to reject out-of-order writes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    /// Comments attached to the source
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Groups the source is saved to
    #[serde(default)]
    pub groups: Vec<Group>,
    /// Fields this client does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Source {
    /// Whether `other` may replace `self` without regressing to older data
    ///
    /// Sources without a modification time fall back to last-write-wins.
    pub fn superseded_by(&self, other: &Source) -> bool {
        match (self.modified, other.modified) {
            (Some(current), Some(incoming)) => incoming >= current,
            _ => true,
        }
    }
}

/// A comment on a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier
    pub id: i64,
    /// Comment body
    pub text: String,
    /// Author username
    pub author: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A group of users sharing data access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Group identifier
    pub id: GroupId,
    /// Display name
    pub name: String,
}

/// A single photometry point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photometry {
    /// Photometry identifier
    pub id: PhotometryId,
    /// Owning object
    pub obj_id: ObjId,
    /// Modified Julian date of observation
    pub mjd: f64,
    /// Magnitude, absent for non-detections
    #[serde(default)]
    pub mag: Option<f64>,
    /// Magnitude error
    #[serde(default)]
    pub magerr: Option<f64>,
    /// Filter name (e.g. `ztfg`)
    pub filter: String,
    /// Instrument identifier
    pub instrument_id: i64,
}

/// A spectrum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    /// Spectrum identifier
    pub id: SpectrumId,
    /// Owning object
    pub obj_id: ObjId,
    /// Observation time
    pub observed_at: DateTime<Utc>,
    /// Instrument identifier
    pub instrument_id: i64,
    /// Wavelengths (Angstrom)
    #[serde(default)]
    pub wavelengths: Vec<f64>,
    /// Fluxes matching `wavelengths`
    #[serde(default)]
    pub fluxes: Vec<f64>,
}

/// The current user's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Username
    pub username: String,
    /// Role names
    #[serde(default)]
    pub roles: Vec<String>,
    /// Access control list entries
    #[serde(default)]
    pub acls: Vec<String>,
    /// Free-form user preferences
    #[serde(default)]
    pub preferences: Value,
}

/// One page of the source list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcePage {
    /// Sources on this page
    pub sources: Vec<Source>,
    /// 1-based page number
    #[serde(rename = "pageNumber")]
    pub page_number: u32,
    /// Whether this is the last page
    #[serde(rename = "lastPage", default)]
    pub last_page: bool,
    /// Total number of matching sources
    #[serde(rename = "totalMatches", default)]
    pub total_matches: u64,
}

/// Which kind of plot an artifact renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotKind {
    /// Light curve
    Photometry,
    /// Spectra overlay
    Spectroscopy,
}

impl PlotKind {
    /// Endpoint segment used in the plot URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            PlotKind::Photometry => "plot/photometry",
            PlotKind::Spectroscopy => "plot/spectroscopy",
        }
    }
}

/// A rendered plot payload as served by `GET /api/internal/plot/...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotArtifact {
    /// Serialized plot document
    pub docs_json: Value,
    /// Render targets
    pub render_items: Value,
    /// Optional custom model script
    #[serde(default)]
    pub custom_model_js: Option<String>,
    /// Request path that produced the plot
    #[serde(default)]
    pub url: String,
}

/// Severity of a server notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Informational
    Info,
    /// Something went wrong
    Error,
    /// Warning
    Warning,
}

/// Datasets that can be selected for sharing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    /// Photometry rows
    Photometry,
    /// Spectrum rows
    Spectra,
}
