use super::state::ApiState;
use std::fmt;
use utoipa_axum::router::OpenApiRouter;

/// Controller registry.
///
/// Every controller is an [`OpenApiRouter`], so registering it also registers its
/// operations for endpoint introspection and document generation.
///
/// ```rust,ignore
/// let controllers = Controllers::new().add(OpenApiRouter::new().routes(routes!(list_items)));
/// ```
#[must_use]
pub struct Controllers {
    router: OpenApiRouter<ApiState>,
    count: usize,
}

impl Controllers {
    pub fn new() -> Self {
        Self { router: OpenApiRouter::new(), count: 0 }
    }

    pub fn add(mut self, controller: OpenApiRouter<ApiState>) -> Self {
        self.router = self.router.merge(controller);
        self.count += 1;
        self
    }

    /// Number of registered controllers.
    pub const fn len(&self) -> usize {
        self.count
    }

    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn into_router(self) -> OpenApiRouter<ApiState> {
        self.router
    }
}

impl Default for Controllers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Controllers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controllers").field("count", &self.count).finish_non_exhaustive()
    }
}
