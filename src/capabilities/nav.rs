use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// Fire-and-forget navigation. Requested exactly once, after a successful
/// submission; the shell tears the registration view down in response.
#[derive(Clone)]
pub struct Nav<Ev> {
    context: CapabilityContext<NavOperation, Ev>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavOperation {
    Home,
}

impl Operation for NavOperation {
    type Output = ();
}

impl<Ev> Nav<Ev>
where
    Ev: 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<NavOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn home(&self) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(NavOperation::Home).await;
        });
    }
}

impl<Ev> Capability<Ev> for Nav<Ev> {
    type Operation = NavOperation;
    type MappedSelf<MappedEv> = Nav<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Nav::new(self.context.map_event(f))
    }
}
