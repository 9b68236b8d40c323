use crate::error::LocationError;
use async_trait::async_trait;
use geofence::Coordinate;

/// Source of the tutor's current position.
///
/// Acquisition is asynchronous and may be slow; the session applies its own
/// timeout and cancellation around the call.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_location(&self) -> Result<Coordinate, LocationError>;
}

#[async_trait]
impl<T: LocationProvider + ?Sized> LocationProvider for std::sync::Arc<T> {
    async fn current_location(&self) -> Result<Coordinate, LocationError> {
        (**self).current_location().await
    }
}
