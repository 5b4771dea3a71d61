//! Custom tracing layers for Floorboard

use tracing::{Subscriber, span};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{
    layer::{Context, Layer},
    registry::LookupSpan,
};

use crate::config::JsonlConfig;
use crate::context::{ResidentContextData, ResidentContextGuard};

/// Layer that attaches the active resident context to new spans
///
/// Spans opened while a [`ResidentContextGuard`] is alive carry a
/// [`ResidentContextExtension`].
#[derive(Debug, Default)]
pub struct ResidentContextLayer;

impl ResidentContextLayer {
    pub fn new() -> Self {
        Self
    }
}

/// Extension data stored on spans
#[derive(Debug, Clone)]
pub struct ResidentContextExtension {
    pub data: ResidentContextData,
}

impl<S> Layer<S> for ResidentContextLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, _attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id)
            && let Some(resident) = ResidentContextGuard::current()
        {
            span.extensions_mut()
                .insert(ResidentContextExtension { data: resident });
        }
    }
}

/// JSONL formatting layer writing to `writer`
pub fn jsonl_layer<S, W>(writer: W, config: &JsonlConfig) -> impl Layer<S>
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(config.include_current_span)
        .with_span_list(config.include_spans)
        .flatten_event(config.flatten_events)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_thread_ids(config.include_thread_info)
        .with_thread_names(config.include_thread_info)
        .with_writer(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorboard_core::PrincipalId;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::registry::Registry;

    /// Records whether the last span saw the extension
    #[derive(Clone, Default)]
    struct Probe(std::sync::Arc<std::sync::Mutex<Option<String>>>);

    impl<S> Layer<S> for Probe
    where
        S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    {
        fn on_enter(&self, id: &span::Id, ctx: Context<'_, S>) {
            if let Some(span) = ctx.span(id) {
                let seen = span
                    .extensions()
                    .get::<ResidentContextExtension>()
                    .map(|ext| ext.data.principal_id.clone());
                *self.0.lock().unwrap() = seen;
            }
        }
    }

    #[test]
    fn test_span_carries_resident() {
        let probe = Probe::default();
        let subscriber = Registry::default()
            .with(ResidentContextLayer::new())
            .with(probe.clone());

        tracing::subscriber::with_default(subscriber, || {
            let _guard = ResidentContextGuard::new(&PrincipalId::new("uid-5"));
            tracing::info_span!("feed").in_scope(|| {});
        });
        assert_eq!(probe.0.lock().unwrap().as_deref(), Some("uid-5"));
    }

    #[test]
    fn test_span_without_resident() {
        let probe = Probe::default();
        let subscriber = Registry::default()
            .with(ResidentContextLayer::new())
            .with(probe.clone());

        tracing::subscriber::with_default(subscriber, || {
            tracing::info_span!("feed").in_scope(|| {});
        });
        assert_eq!(*probe.0.lock().unwrap(), None);
    }
}
