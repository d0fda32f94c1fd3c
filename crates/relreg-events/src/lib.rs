mod event;
mod sink;

use std::sync::Arc;

pub use event::*;
pub use sink::*;

/// Shared handle to an event sink.
pub type EventSinkHandle = Arc<dyn EventSink>;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_null_sink() {
        let sink = NullSink;
        sink.emit(BuildEvent::DomainStarted {
            domain: Domain::Packages,
        });
    }

    #[test]
    fn test_channel_sink() {
        let (sink, rx) = ChannelSink::new();
        sink.emit(BuildEvent::DomainStarted {
            domain: Domain::Sdks,
        });
        sink.emit(BuildEvent::EntitySkipped {
            domain: Domain::Sdks,
            id: "react".to_string(),
            reason: "missing canonical".to_string(),
        });
        sink.emit(BuildEvent::DomainComplete {
            domain: Domain::Sdks,
            written: 3,
            skipped: 1,
        });

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[1],
            BuildEvent::EntitySkipped { id, .. } if id == "react"
        ));
        assert!(matches!(
            &events[2],
            BuildEvent::DomainComplete {
                written: 3,
                skipped: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_channel_sink_receiver_dropped() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.emit(BuildEvent::BuildFailed {
            error: "orphaned".to_string(),
        });
    }

    #[test]
    fn test_collector_sink_through_handle() {
        let collector = Arc::new(CollectorSink::default());
        assert!(collector.is_empty());

        let sink: EventSinkHandle = collector.clone();
        sink.emit(BuildEvent::BuildComplete {
            duration: Duration::from_millis(5),
        });
        assert_eq!(collector.len(), 1);
        assert!(collector.events()[0].is_terminal());
    }

    #[test]
    fn test_event_sink_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NullSink>();
        assert_send_sync::<ChannelSink>();
        assert_send_sync::<CollectorSink>();
    }

    #[test]
    fn test_event_domain() {
        let event = BuildEvent::EntityWritten {
            domain: Domain::Apps,
            id: "sentry-cli".to_string(),
        };
        assert_eq!(event.domain(), Some(Domain::Apps));
        assert_eq!(
            BuildEvent::BuildStarted {
                parallel: true,
                max_workers: 5
            }
            .domain(),
            None
        );
    }

    #[test]
    fn test_domain_names() {
        let names: Vec<_> = Domain::ALL.iter().map(|d| d.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "packages",
                "sdks",
                "apps",
                "aws-lambda-layers",
                "marketing-slugs"
            ]
        );
        assert_eq!(Domain::AwsLambdaLayers.label(), "lambda layers");
    }
}
