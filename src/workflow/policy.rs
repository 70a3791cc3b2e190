/// Chooses where an integration run lands.
///
/// A message means the operator wants a reviewed commit on trunk; no message
/// means routine integration of in-progress work onto the shared branch.
#[derive(Debug, Clone, Copy)]
pub struct IntegrationPolicy<'a> {
    trunk: &'a str,
    integration: &'a str,
}

impl<'a> IntegrationPolicy<'a> {
    pub fn new(trunk: &'a str, integration: &'a str) -> Self {
        Self { trunk, integration }
    }

    /// Destination branch for a run invoked with `message`.
    ///
    /// A blank message counts as absent.
    pub fn destination(&self, message: Option<&str>) -> &'a str {
        match message {
            Some(m) if !m.trim().is_empty() => self.trunk,
            _ => self.integration,
        }
    }
}
