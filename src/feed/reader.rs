//! Record reconstruction from the feed's JSON structure.
//!
//! `serde_json` walks the document once; the visitors below never build a
//! tree. Each record array is poured scalar by scalar into the reconstructor,
//! which turns the finished buffer into a [`Record`] and hands it to a sink.

use std::fmt;
use std::io::BufRead;
use std::mem;
use std::ops::ControlFlow;

use serde::de::{self, DeserializeSeed, Deserializer as _, IgnoredAny, MapAccess, SeqAccess, Visitor};
use tracing::{debug, trace};

use super::error::FeedError;
use crate::record::{FIELD_COUNT, Record};

/// Key under which the published feed stores its record arrays.
///
/// The feed root is an object with repeated keys: a couple of header arrays
/// under `"Filmliste"` followed by one `"X"` array per program.
pub const RECORD_KEY: &str = "X";

#[derive(Debug)]
enum State {
    Idle,
    Accumulating(Vec<String>),
}

/// Why a visitor stopped the deserializer early.
#[derive(Debug)]
enum Halt {
    Failed(FeedError),
    Stopped,
}

/// Reconstructs records from the feed's JSON document.
///
/// Record arrays are the arrays directly inside the root container; for an
/// object root only those under [`RECORD_KEY`]. The reader keeps one raw
/// field buffer and the last emitted record, nothing more. The first error is
/// delivered once and ends the pass.
///
/// # Example
///
/// ```no_run
/// use std::io::BufReader;
/// use std::ops::ControlFlow;
///
/// use mtv_core::FeedReader;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let file = BufReader::new(std::fs::File::open("filme.json")?);
/// let emitted = FeedReader::from_reader(file).for_each_record(|item| {
///     if let Ok(record) = item {
///         println!("{record}");
///     }
///     ControlFlow::Continue(())
/// });
/// println!("{emitted} records");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FeedReader<R> {
    reader: R,
}

impl<R: BufRead> FeedReader<R> {
    /// Creates a reader over raw JSON bytes.
    pub fn from_reader(reader: R) -> Self {
        Self { reader }
    }

    /// Runs the pass, handing each record to `sink` in feed order.
    ///
    /// A feed error is passed to `sink` as the final item. Returning
    /// [`ControlFlow::Break`] from `sink` stops reading. Returns the number of
    /// records emitted.
    pub fn for_each_record<F>(self, sink: F) -> u64
    where
        F: FnMut(Result<Record, FeedError>) -> ControlFlow<()>,
    {
        let mut reconstructor = Reconstructor::new(sink);
        let mut deserializer = serde_json::Deserializer::from_reader(self.reader);
        let outcome = (&mut deserializer)
            .deserialize_any(RootVisitor(&mut reconstructor))
            .and_then(|()| deserializer.end());

        let emitted = reconstructor.emitted;
        match (reconstructor.halt.take(), outcome) {
            (Some(Halt::Stopped), _) => debug!(emitted, "feed pass stopped by consumer"),
            (Some(Halt::Failed(error)), _) => reconstructor.deliver_error(error),
            (None, Err(error)) => reconstructor.deliver_error(FeedError::from(error)),
            (None, Ok(())) => debug!(emitted, "feed pass complete"),
        }
        emitted
    }

    /// Collects every record, or returns the first error.
    ///
    /// # Errors
    ///
    /// Returns the [`FeedError`] that ended the pass.
    pub fn read_all(self) -> Result<Vec<Record>, FeedError> {
        let mut records = Vec::new();
        let mut failure = None;
        self.for_each_record(|item| match item {
            Ok(record) => {
                records.push(record);
                ControlFlow::Continue(())
            }
            Err(error) => {
                failure = Some(error);
                ControlFlow::Break(())
            }
        });
        failure.map_or(Ok(records), Err)
    }
}

/// The Idle/Accumulating machine plus the preceding-record slot.
struct Reconstructor<F> {
    state: State,
    previous: Option<Record>,
    emitted: u64,
    sink: F,
    halt: Option<Halt>,
}

impl<F> Reconstructor<F>
where
    F: FnMut(Result<Record, FeedError>) -> ControlFlow<()>,
{
    fn new(sink: F) -> Self {
        Self {
            state: State::Idle,
            previous: None,
            emitted: 0,
            sink,
            halt: None,
        }
    }

    fn begin_record(&mut self) {
        self.state = State::Accumulating(Vec::with_capacity(FIELD_COUNT));
    }

    fn push_scalar(&mut self, value: String) {
        if let State::Accumulating(fields) = &mut self.state {
            fields.push(value);
        }
    }

    /// Emits the buffered record. Returns `false` when the pass must stop.
    fn end_record(&mut self) -> bool {
        let State::Accumulating(fields) = mem::replace(&mut self.state, State::Idle) else {
            return true;
        };
        let index = self.emitted;
        let record = match Record::from_fields(fields) {
            Ok(record) => record.inherit_from(self.previous.as_ref()),
            Err(source) => {
                self.halt = Some(Halt::Failed(FeedError::Record { index, source }));
                return false;
            }
        };
        trace!(index, record = %record, "reconstructed record");
        self.previous = Some(record.clone());
        self.emitted += 1;
        if (self.sink)(Ok(record)).is_break() {
            self.halt = Some(Halt::Stopped);
            return false;
        }
        true
    }

    fn nested_container(&mut self) {
        self.halt = Some(Halt::Failed(FeedError::NestedContainer {
            index: self.emitted,
        }));
    }

    fn deliver_error(&mut self, error: FeedError) {
        let _ = (self.sink)(Err(error));
    }
}

fn halted<E: de::Error>() -> E {
    E::custom("feed pass halted")
}

/// Walks the root array or object.
struct RootVisitor<'a, F>(&'a mut Reconstructor<F>);

impl<'de, F> Visitor<'de> for RootVisitor<'_, F>
where
    F: FnMut(Result<Record, FeedError>) -> ControlFlow<()>,
{
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an array or object of record arrays")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element_seed(RecordSeed(&mut *self.0))?.is_some() {}
        Ok(())
    }

    fn visit_map<A>(self, mut map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        // Keys repeat, so entries are consumed one by one instead of into a map.
        while let Some(key) = map.next_key::<String>()? {
            if key == RECORD_KEY {
                map.next_value_seed(RecordSeed(&mut *self.0))?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

/// One record array.
struct RecordSeed<'a, F>(&'a mut Reconstructor<F>);

impl<'de, F> DeserializeSeed<'de> for RecordSeed<'_, F>
where
    F: FnMut(Result<Record, FeedError>) -> ControlFlow<()>,
{
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de, F> Visitor<'de> for RecordSeed<'_, F>
where
    F: FnMut(Result<Record, FeedError>) -> ControlFlow<()>,
{
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a record array")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        self.0.begin_record();
        while seq.next_element_seed(ScalarSeed(&mut *self.0))?.is_some() {}
        if self.0.end_record() {
            Ok(())
        } else {
            Err(halted())
        }
    }
}

/// One field of a record array, rendered as text.
struct ScalarSeed<'a, F>(&'a mut Reconstructor<F>);

impl<'de, F> DeserializeSeed<'de> for ScalarSeed<'_, F>
where
    F: FnMut(Result<Record, FeedError>) -> ControlFlow<()>,
{
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, F> Visitor<'de> for ScalarSeed<'_, F>
where
    F: FnMut(Result<Record, FeedError>) -> ControlFlow<()>,
{
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a string, number, boolean or null")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<(), E> {
        self.0.push_scalar(value.to_owned());
        Ok(())
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<(), E> {
        self.0.push_scalar(value);
        Ok(())
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<(), E> {
        self.0.push_scalar(value.to_string());
        Ok(())
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<(), E> {
        self.0.push_scalar(value.to_string());
        Ok(())
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<(), E> {
        self.0.push_scalar(value.to_string());
        Ok(())
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<(), E> {
        self.0.push_scalar(value.to_string());
        Ok(())
    }

    fn visit_unit<E: de::Error>(self) -> Result<(), E> {
        self.0.push_scalar(String::new());
        Ok(())
    }

    fn visit_seq<A>(self, _seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        self.0.nested_container();
        Err(halted())
    }

    fn visit_map<A>(self, _map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        self.0.nested_container();
        Err(halted())
    }
}
