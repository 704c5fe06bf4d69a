pub mod classifier;
pub mod disease;
pub mod gene;
pub mod organism;
pub mod user;

pub use classifier::{Classifier, ClassifierChanges, NewClassifier};
pub use disease::Disease;
pub use gene::{Gene, NewGene};
pub use organism::{NewOrganism, Organism};
pub use user::{User, UserChanges};
