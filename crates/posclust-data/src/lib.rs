//! Player-season observation data.
//!
//! This crate loads the season statistics dataset, validates its schema and
//! prepares the numeric feature matrix used by the clustering pipeline.
//!
//! # Modules
//!
//! - [`table`] - CSV loading into an [`ObservationTable`]
//! - [`position`] - position category schemes ([`PositionScheme`])
//! - [`features`] - identifier/indicator column removal ([`prepare_features`])
//! - [`years`] - inclusive season ranges ([`YearRange`])
//! - [`error`] - [`SchemaError`]
//!
//! # Example
//!
//! ```
//! use posclust_data::{FeatureOptions, ObservationTable, PositionScheme, prepare_features};
//!
//! let csv = "\
//! ID,Year,Player,Tm,Pos,Pos_PG,Pos_SG,Pos_SF,Pos_PF,Pos_C,PTS
//! 1,1999,A,NYK,SF,0,0,1,0,0,22.0
//! 2,1999,B,NYK,PF,0,0,0,1,0,15.5
//! ";
//! let table = ObservationTable::from_reader(csv.as_bytes()).unwrap();
//! let features = prepare_features(&table, FeatureOptions::default()).unwrap();
//! assert_eq!(features.names, ["PTS"]);
//! assert_eq!(PositionScheme::default().categories().len(), 5);
//! ```

pub use self::{
    error::SchemaError,
    features::{FeatureMatrix, FeatureOptions, prepare_features},
    position::PositionScheme,
    table::{ObservationTable, PlayerSeason},
    years::YearRange,
};

pub mod error;
pub mod features;
pub mod position;
pub mod table;
pub mod years;
