//! Structural tracing.
//!
//! A [`Tracer`] attached to a [`BTreeFile`](super::BTreeFile) sees every
//! page visited by a descent and any children dumps requested through
//! `trace_children`. Tracing is observability only: a tracer cannot change
//! or fail an operation.

use std::io::Write;

use log::warn;

use crate::common::PageId;
use crate::index::btree::LeafEntry;

/// Something the tree reports to its tracer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A descent pinned this page.
    Visit(PageId),
    /// Children of an index page, leftmost first.
    IndexChildren {
        page_id: PageId,
        leftmost: PageId,
        children: Vec<PageId>,
    },
    /// Entries of a leaf page.
    LeafChildren {
        page_id: PageId,
        entries: Vec<LeafEntry>,
    },
}

/// Receives trace events from one tree handle.
pub trait Tracer {
    fn record(&mut self, event: &TraceEvent);
}

/// Collects events in memory.
impl Tracer for Vec<TraceEvent> {
    fn record(&mut self, event: &TraceEvent) {
        self.push(event.clone());
    }
}

impl<T: Tracer + ?Sized> Tracer for &mut T {
    fn record(&mut self, event: &TraceEvent) {
        (**self).record(event);
    }
}

/// Writes events as text lines.
///
/// ```text
/// VISIT node 7
/// INDEX CHILDREN 7 nodes
///  2
///    5
///    9
/// LEAF CHILDREN 5 nodes
///    42 [3, 1]
/// ```
pub struct WriterTracer<W: Write> {
    out: W,
}

impl<W: Write> WriterTracer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_event(&mut self, event: &TraceEvent) -> std::io::Result<()> {
        match event {
            TraceEvent::Visit(page_id) => writeln!(self.out, "VISIT node {}", page_id.0),
            TraceEvent::IndexChildren {
                page_id,
                leftmost,
                children,
            } => {
                writeln!(self.out, "INDEX CHILDREN {} nodes", page_id.0)?;
                writeln!(self.out, " {}", leftmost.0)?;
                for child in children {
                    writeln!(self.out, "   {}", child.0)?;
                }
                Ok(())
            }
            TraceEvent::LeafChildren { page_id, entries } => {
                writeln!(self.out, "LEAF CHILDREN {} nodes", page_id.0)?;
                for entry in entries {
                    writeln!(self.out, "   {}", entry)?;
                }
                Ok(())
            }
        }
    }
}

impl<W: Write> Tracer for WriterTracer<W> {
    fn record(&mut self, event: &TraceEvent) {
        if let Err(e) = self.write_event(event) {
            warn!("dropping trace event {:?}: {}", event, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::RecordId;

    #[test]
    fn test_vec_tracer_collects() {
        fn visit<T: Tracer>(mut tracer: T, id: u32) {
            tracer.record(&TraceEvent::Visit(PageId::new(id)));
        }

        let mut events: Vec<TraceEvent> = Vec::new();
        visit(&mut events, 4);
        events.record(&TraceEvent::Visit(PageId::new(5)));

        assert_eq!(
            events,
            vec![
                TraceEvent::Visit(PageId::new(4)),
                TraceEvent::Visit(PageId::new(5))
            ]
        );
    }

    #[test]
    fn test_writer_tracer_format() {
        let mut tracer = WriterTracer::new(Vec::new());
        tracer.record(&TraceEvent::Visit(PageId::new(7)));
        tracer.record(&TraceEvent::IndexChildren {
            page_id: PageId::new(7),
            leftmost: PageId::new(2),
            children: vec![PageId::new(5), PageId::new(9)],
        });
        tracer.record(&TraceEvent::LeafChildren {
            page_id: PageId::new(5),
            entries: vec![LeafEntry::new(42i64, RecordId::new(PageId::new(3), 1))],
        });

        let text = String::from_utf8(tracer.into_inner()).unwrap();
        assert_eq!(
            text,
            "VISIT node 7\n\
             INDEX CHILDREN 7 nodes\n \
             2\n   5\n   9\n\
             LEAF CHILDREN 5 nodes\n   42 [3, 1]\n"
        );
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writer_errors_are_swallowed() {
        let mut tracer = WriterTracer::new(FailingWriter);
        tracer.record(&TraceEvent::Visit(PageId::new(1)));
    }
}
