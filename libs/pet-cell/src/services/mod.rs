pub mod breeds;
pub mod pet;

pub use breeds::BreedService;
pub use pet::PetService;
