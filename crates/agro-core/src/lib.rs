//! # agro-core: Domain Types for the Producer Registry
//!
//! Value objects and entities for agricultural producers, their farms and
//! the crops those farms grow. Nothing here performs I/O; every type
//! validates itself at construction and the stores only ever persist
//! values that already passed.
//!
//! ## Value objects
//!
//! - [`Document`]: a taxpayer document classified as CPF or CNPJ by its
//!   check digits.
//! - [`HectaresArea`]: total, arable and vegetation areas whose parts sum to
//!   the total at four decimal places.
//! - [`StateCode`]: one of the 27 federative-unit codes.
//! - [`PersonName`]: a name with at least two tokens.
//!
//! ## Crate Policy
//!
//! - Leaf of the workspace: no internal dependencies.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Validation failures are [`ValidationError`]s and carry an [`ErrorCode`].

pub mod area;
pub mod crop;
pub mod document;
pub mod error;
pub mod farm;
pub mod id;
pub mod name;
pub mod producer;
pub mod state_code;

pub use area::{HectaresArea, AREA_PRECISION};
pub use crop::{Crop, CropRef};
pub use document::{Document, DocumentKind};
pub use error::{ErrorCode, ValidationError};
pub use farm::{Farm, FarmDraft};
pub use id::{CropId, FarmId, ParseIdError, ProducerId};
pub use name::PersonName;
pub use producer::Producer;
pub use state_code::{StateCode, STATE_CODES};
