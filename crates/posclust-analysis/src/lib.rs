//! Position clustering analysis.
//!
//! This crate turns an [`ObservationTable`](posclust_data::ObservationTable)
//! into cluster assignments and measures how well the clusters line up with
//! the players' listed positions.
//!
//! # Modules
//!
//! - [`config`]: [`PipelineConfig`] and its validation
//! - [`normalization`]: column scaling and row unit normalization
//! - [`reduction`]: principal component analysis
//! - [`evaluation`]: Calinski-Harabasz, silhouette, Davies-Bouldin and
//!   cophenetic correlation
//! - [`concentration`]: per-cluster position mix and entropy
//! - [`pipeline`]: [`run_pipeline`], which chains all of the above
//!
//! # Example
//!
//! ```
//! use posclust_analysis::{PipelineConfig, config::ClusterMethod, run_pipeline};
//! use posclust_data::{ObservationTable, PositionScheme};
//!
//! let csv = "\
//! ID,Year,Player,Tm,Pos,Pos_G,Pos_F,Pos_C,AST,TRB
//! 1,2015,A,GSW,G,1,0,0,7.7,4.3
//! 2,2015,B,GSW,C,0,0,1,1.2,9.8
//! 3,2015,C,SAS,G,1,0,0,6.9,3.8
//! 4,2015,D,SAS,C,0,0,1,1.9,10.5
//! ";
//! let table = ObservationTable::from_reader(csv.as_bytes()).unwrap();
//! let config = PipelineConfig {
//!     scheme: PositionScheme::Three,
//!     cluster_count: 2,
//!     method: ClusterMethod::KMeans,
//!     ..PipelineConfig::default()
//! };
//! let run = run_pipeline(&table, &config).unwrap();
//! assert_eq!(run.assignment.labels(), [0, 1, 0, 1]);
//! ```

pub use self::{
    config::PipelineConfig,
    pipeline::{PipelineError, PipelineRun, PreparedMatrix, prepare_matrix, run_pipeline},
};

pub mod concentration;
pub mod config;
pub mod evaluation;
pub mod normalization;
pub mod pipeline;
pub mod reduction;
