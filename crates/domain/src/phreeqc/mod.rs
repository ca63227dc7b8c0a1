//! PHREEQC input rendering and selected-output interpretation. Running the
//! engine itself lives behind [`crate::simulator::Simulator`].

mod deck;
mod output;
pub mod titration;

pub use deck::InputDeck;
pub use output::{OutputError, Row, SelectedOutput, Value};
pub use titration::{borate_ratio, titration_curve, TitrationPoint};
