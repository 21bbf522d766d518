//! UseCase layer

pub mod broadcast;

pub use broadcast::BroadcastUseCase;
