pub mod household;

pub use household::{KeluargaUmat, Pasangan, Tanggungan, User};
