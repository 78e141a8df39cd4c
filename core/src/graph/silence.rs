use std::ops::{Deref, DerefMut};

use super::CellGraph;

/// Disables change notifications on a graph for as long as it lives.
///
/// The previous notification state is restored on drop, so early returns
/// and `?` inside the silenced scope cannot leave a graph muted.
///
/// ```ignore
/// {
///     let mut silent = Silenced::new(&mut graph);
///     silent.set(child, attributes(PARENT, new_id.into()), ChangeOrigin::Programmatic)?;
/// } // notifications are back on here
/// ```
pub struct Silenced<'a, G: CellGraph + ?Sized> {
    graph: &'a mut G,
    restore: bool,
}

impl<'a, G: CellGraph + ?Sized> Silenced<'a, G> {
    pub fn new(graph: &'a mut G) -> Self {
        let restore = graph.notifications_enabled();
        graph.set_notifications_enabled(false);
        Self { graph, restore }
    }
}

impl<G: CellGraph + ?Sized> Deref for Silenced<'_, G> {
    type Target = G;

    fn deref(&self) -> &G {
        self.graph
    }
}

impl<G: CellGraph + ?Sized> DerefMut for Silenced<'_, G> {
    fn deref_mut(&mut self) -> &mut G {
        self.graph
    }
}

impl<G: CellGraph + ?Sized> Drop for Silenced<'_, G> {
    fn drop(&mut self) {
        self.graph.set_notifications_enabled(self.restore);
    }
}
