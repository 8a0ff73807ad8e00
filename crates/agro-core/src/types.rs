//! # Domain Types
//!
//! Core domain types used throughout the producer registry.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Producer     │   │  ProducerCrop   │   │      Crop       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  producer_id    │   │  id (UUID)      │       │
//! │  │  document       │   │  crop ──────────┼──►│  name           │       │
//! │  │  total_area     │   │  id (UUID)      │   └─────────────────┘       │
//! │  │  agri/veg area  │   └─────────────────┘                              │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ProducerRecord = Producer + its ProducerCrop associations             │
//! │  ProducerResponse = Producer + resolved Crops (wire shape)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::area::Area;

/// Reference crops seeded at schema initialization as `(id, name)`.
///
/// The ids are fixed so that every store (SQLite migration, in-memory fake)
/// hands out the same identifiers.
pub const SEED_CROPS: [(&str, &str); 5] = [
    ("5f8d0d55-1b1a-4b6e-9a43-0d2a6a1c0001", "Soybean"),
    ("5f8d0d55-1b1a-4b6e-9a43-0d2a6a1c0002", "Corn"),
    ("5f8d0d55-1b1a-4b6e-9a43-0d2a6a1c0003", "Cotton"),
    ("5f8d0d55-1b1a-4b6e-9a43-0d2a6a1c0004", "Coffee"),
    ("5f8d0d55-1b1a-4b6e-9a43-0d2a6a1c0005", "Sugarcane"),
];

// =============================================================================
// Crop
// =============================================================================

/// An entry of the fixed crop vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Crop {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Producer
// =============================================================================

/// A registered farm/grower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Producer {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// CPF or CNPJ, unique across all producers.
    pub document: String,

    pub producer_name: String,

    pub farm_name: String,

    pub city: String,

    pub state: String,

    /// Total farm area.
    #[ts(type = "number")]
    pub total_area: Area,

    /// Arable area.
    #[ts(type = "number")]
    pub agricultural_area: Area,

    /// Native vegetation area.
    #[ts(type = "number")]
    pub vegetation_area: Area,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Producer Crop Association
// =============================================================================

/// "This producer grows this crop."
///
/// Owned by the producer; the store deletes it when either side goes away.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProducerCrop {
    pub id: String,
    pub producer_id: String,
    pub crop: Crop,
}

/// A producer loaded together with its associations.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerRecord {
    pub producer: Producer,
    pub associations: Vec<ProducerCrop>,
}

impl ProducerRecord {
    /// Ids of the crops currently associated with the producer.
    pub fn crop_ids(&self) -> Vec<&str> {
        self.associations
            .iter()
            .map(|association| association.crop.id.as_str())
            .collect()
    }

    /// Flattens the association rows into the wire shape.
    pub fn into_response(self) -> ProducerResponse {
        ProducerResponse {
            producer: self.producer,
            crops: self
                .associations
                .into_iter()
                .map(|association| association.crop)
                .collect(),
        }
    }
}

/// Producer as returned to API consumers: the producer fields plus its crops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProducerResponse {
    #[serde(flatten)]
    pub producer: Producer,
    pub crops: Vec<Crop>,
}

// =============================================================================
// Inputs
// =============================================================================

/// Fields required to register a producer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateProducerInput {
    pub document: String,
    pub producer_name: String,
    pub farm_name: String,
    pub city: String,
    pub state: String,
    #[ts(type = "number")]
    pub total_area: Area,
    #[ts(type = "number")]
    pub agricultural_area: Area,
    #[ts(type = "number")]
    pub vegetation_area: Area,
    /// Crop ids; must be non-empty and reference existing crops.
    pub crops: Vec<String>,
}

impl CreateProducerInput {
    /// Builds the producer row this input describes.
    pub fn into_producer(self, id: String, now: DateTime<Utc>) -> Producer {
        Producer {
            id,
            document: self.document,
            producer_name: self.producer_name,
            farm_name: self.farm_name,
            city: self.city,
            state: self.state,
            total_area: self.total_area,
            agricultural_area: self.agricultural_area,
            vegetation_area: self.vegetation_area,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update: every field is optional, absent fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct UpdateProducerInput {
    pub document: Option<String>,
    pub producer_name: Option<String>,
    pub farm_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[ts(type = "number | null")]
    pub total_area: Option<Area>,
    #[ts(type = "number | null")]
    pub agricultural_area: Option<Area>,
    #[ts(type = "number | null")]
    pub vegetation_area: Option<Area>,
    pub crops: Option<Vec<String>>,
}

impl UpdateProducerInput {
    /// The area triple, when all three fields are present.
    pub fn area_triple(&self) -> Option<(Area, Area, Area)> {
        match (self.total_area, self.agricultural_area, self.vegetation_area) {
            (Some(total), Some(agricultural), Some(vegetation)) => {
                Some((total, agricultural, vegetation))
            }
            _ => None,
        }
    }

    /// Number of area fields carried by the request (0 to 3).
    pub fn area_fields_present(&self) -> usize {
        [
            self.total_area.is_some(),
            self.agricultural_area.is_some(),
            self.vegetation_area.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    /// Applies every provided scalar field over `producer`.
    ///
    /// The crop list is not a scalar and is left to reconciliation.
    pub fn apply_to(&self, producer: &mut Producer, now: DateTime<Utc>) {
        if let Some(document) = &self.document {
            producer.document = document.clone();
        }
        if let Some(producer_name) = &self.producer_name {
            producer.producer_name = producer_name.clone();
        }
        if let Some(farm_name) = &self.farm_name {
            producer.farm_name = farm_name.clone();
        }
        if let Some(city) = &self.city {
            producer.city = city.clone();
        }
        if let Some(state) = &self.state {
            producer.state = state.clone();
        }
        if let Some(total_area) = self.total_area {
            producer.total_area = total_area;
        }
        if let Some(agricultural_area) = self.agricultural_area {
            producer.agricultural_area = agricultural_area;
        }
        if let Some(vegetation_area) = self.vegetation_area {
            producer.vegetation_area = vegetation_area;
        }
        producer.updated_at = now;
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Producer count for one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StateCount {
    pub state: String,
    pub count: i64,
}

/// Association count for one crop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CropCount {
    pub crop: String,
    pub count: i64,
}

/// Summed land use across all producers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LandUsage {
    #[ts(type = "number")]
    pub agricultural_area: Area,
    #[ts(type = "number")]
    pub vegetation_area: Area,
}

/// Aggregate metrics as of the current store state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardData {
    pub total_farms: i64,
    #[ts(type = "number")]
    pub total_area: Area,
    pub farms_by_state: Vec<StateCount>,
    /// Counts associations: a producer with N crops contributes N times.
    pub farms_by_crop: Vec<CropCount>,
    pub land_usage: LandUsage,
}

// =============================================================================
// Unit Tests
// =============================================================================
