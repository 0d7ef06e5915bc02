//! Fluent builder for constructing a [`Sim`].

use hv_core::{HubId, SimConfig};
use hv_hub::{Hub, HubSpec};
use hv_motion::MotionFactory;
use hv_spatial::{NavSurface, OpenGround};

use crate::{Sim, SimError, SimResult};

/// Fluent builder for [`Sim<F>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: ticks, seed, pool, slot and agent tuning
/// - `F: MotionFactory`: the movement layer (e.g. [`hv_motion::LinearMotionFactory`])
/// - at least one hub via `.hub(..)` or `.hubs(..)`
///
/// # Optional inputs (have defaults)
///
/// | Method          | Default                    |
/// |-----------------|----------------------------|
/// | `.surface(s)`   | `OpenGround::unbounded()`  |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, LinearMotionFactory::default())
///     .hub(HubSpec::new("Blue", Vec3::ground(-8.0, 0.0)))
///     .hub(HubSpec::new("Red", Vec3::ground(8.0, 0.0)))
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<F: MotionFactory> {
    config:  SimConfig,
    factory: F,
    hubs:    Vec<HubSpec>,
    surface: Option<Box<dyn NavSurface>>,
}

impl<F: MotionFactory> SimBuilder<F> {
    pub fn new(config: SimConfig, factory: F) -> Self {
        Self { config, factory, hubs: Vec::new(), surface: None }
    }

    /// Add one hub.  Hubs are numbered in the order they are added.
    pub fn hub(mut self, spec: HubSpec) -> Self {
        self.hubs.push(spec);
        self
    }

    /// Add several hubs, e.g. from [`load_hubs_csv`][crate::load_hubs_csv].
    pub fn hubs(mut self, specs: impl IntoIterator<Item = HubSpec>) -> Self {
        self.hubs.extend(specs);
        self
    }

    /// Navigable-surface service used for spawn and slot placement.
    pub fn surface(mut self, surface: impl NavSurface + 'static) -> Self {
        self.surface = Some(Box::new(surface));
        self
    }

    /// Validate inputs and construct the [`Sim`].
    ///
    /// # Errors
    ///
    /// - [`SimError::Core`] if the config fails validation.
    /// - [`SimError::NoHubs`] if no hub was added.
    /// - [`SimError::Hub`] if a hub spec is invalid.
    pub fn build(self) -> SimResult<Sim<F>> {
        self.config.validate()?;
        if self.hubs.is_empty() {
            return Err(SimError::NoHubs);
        }

        let hubs = self
            .hubs
            .iter()
            .enumerate()
            .map(|(i, spec)| -> SimResult<Hub> {
                let id = HubId::try_from(i)
                    .map_err(|_| SimError::Config(format!("too many hubs ({})", self.hubs.len())))?;
                Ok(Hub::new(id, spec, &self.config.slots)?)
            })
            .collect::<SimResult<Vec<_>>>()?;

        let surface = self.surface.unwrap_or_else(|| Box::new(OpenGround::unbounded()));
        Ok(Sim::new(self.config, self.factory, surface, hubs))
    }
}
