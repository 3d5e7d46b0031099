//! Streaming KML route document parser
//!
//! Reads a driving-directions KML document event by event and collects the
//! `<coordinates>` text of every `<LineString>` into a [`Route`]. Nothing else
//! in the document is interpreted except the route title and summary text;
//! unknown elements are skipped.
//!
//! Parsing never fails from the caller's point of view: [`RouteParser::parse`]
//! logs the problem and returns an empty route. Use
//! [`RouteParser::try_parse`] when the error itself is needed.

use std::io::BufRead;

use domain::value_objects::{Coordinate, MicroPoint, Route};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::RouteError;

const COORDINATES: &str = "coordinates";
const LINE_STRING: &str = "LineString";
const PLACEMARK: &str = "Placemark";
const DOCUMENT: &str = "Document";
const NAME: &str = "name";
const DESCRIPTION: &str = "description";

/// What to do with a point whose numbers cannot be read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPointPolicy {
    /// Drop the point and keep reading
    #[default]
    Skip,
    /// Stop reading; the route keeps the points collected so far
    Abort,
}

/// Parser state between events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    Idle,
    InRouteGeometry,
}

/// Outcome of splitting one geometry run into points
#[derive(Debug, PartialEq, Eq)]
enum RunOutcome {
    Complete,
    Aborted,
}

/// Route document parser
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteParser {
    policy: MalformedPointPolicy,
}

impl RouteParser {
    /// Create a parser with the given malformed-point policy
    #[must_use]
    pub const fn new(policy: MalformedPointPolicy) -> Self {
        Self { policy }
    }

    /// Parse a route document, degrading any failure to an empty route
    pub fn parse<R: BufRead>(&self, reader: R) -> Route {
        match self.try_parse(reader) {
            Ok(route) => route,
            Err(e) => {
                warn!(error = %e, "Failed to parse route document, returning empty route");
                Route::empty()
            },
        }
    }

    /// Parse a route document held in memory
    pub fn parse_bytes(&self, bytes: &[u8]) -> Route {
        self.parse(bytes)
    }

    /// Parse a route document, surfacing structural and I/O errors
    ///
    /// # Errors
    ///
    /// Returns `RouteError::MalformedDocument` for XML that is not well-formed
    /// (including truncated documents) and `RouteError::Io` when the
    /// underlying reader fails.
    pub fn try_parse<R: BufRead>(&self, reader: R) -> Result<Route, RouteError> {
        let mut reader = Reader::from_reader(reader);
        reader.config_mut().trim_text(true);

        let mut builder = RouteBuilder::new(self.policy);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    builder.start_element(name)?;
                },
                Event::Empty(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    builder.start_element(name)?;
                    if builder.end_element() == RunOutcome::Aborted {
                        return Ok(builder.finish());
                    }
                },
                Event::End(_) => {
                    if builder.end_element() == RunOutcome::Aborted {
                        return Ok(builder.finish());
                    }
                },
                Event::Text(t) => {
                    let text = t
                        .unescape()
                        .map_err(|e| RouteError::MalformedDocument(e.to_string()))?;
                    builder.characters(&text)?;
                },
                Event::CData(c) => {
                    let bytes = c.into_inner();
                    let text = std::str::from_utf8(&bytes)
                        .map_err(|e| RouteError::MalformedDocument(e.to_string()))?;
                    builder.characters(text)?;
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        builder.end_document()?;
        Ok(builder.finish())
    }
}

/// Parse a route document with the default (skip) policy
pub fn parse_route<R: BufRead>(reader: R) -> Route {
    RouteParser::default().parse(reader)
}

/// Accumulates parser events into a route
#[derive(Debug)]
struct RouteBuilder {
    policy: MalformedPointPolicy,
    state: ParserState,
    stack: Vec<String>,
    saw_root: bool,
    geometry_text: String,
    field_text: String,
    waypoints: Vec<MicroPoint>,
    name: Option<String>,
    document_description: Option<String>,
    placemark_description: Option<String>,
    placemark_has_route: bool,
    route_description: Option<String>,
}

impl RouteBuilder {
    fn new(policy: MalformedPointPolicy) -> Self {
        Self {
            policy,
            state: ParserState::Idle,
            stack: Vec::new(),
            saw_root: false,
            geometry_text: String::new(),
            field_text: String::new(),
            waypoints: Vec::new(),
            name: None,
            document_description: None,
            placemark_description: None,
            placemark_has_route: false,
            route_description: None,
        }
    }

    fn parent(&self) -> Option<&str> {
        self.stack.len().checked_sub(2).map(|i| self.stack[i].as_str())
    }

    fn start_element(&mut self, name: String) -> Result<(), RouteError> {
        if self.stack.is_empty() && self.saw_root {
            return Err(RouteError::MalformedDocument(format!(
                "element <{name}> after the root element"
            )));
        }
        self.saw_root = true;

        if name == COORDINATES && self.stack.iter().any(|n| n == LINE_STRING) {
            self.state = ParserState::InRouteGeometry;
            self.geometry_text.clear();
        } else if name == PLACEMARK {
            self.placemark_description = None;
            self.placemark_has_route = false;
        }
        self.field_text.clear();
        self.stack.push(name);
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<(), RouteError> {
        if self.stack.is_empty() {
            return Err(RouteError::MalformedDocument(
                "text content outside the root element".to_string(),
            ));
        }
        match self.state {
            ParserState::InRouteGeometry => {
                // keep tokens apart when text arrives in several events
                self.geometry_text.push_str(text);
                self.geometry_text.push(' ');
            },
            ParserState::Idle => self.field_text.push_str(text),
        }
        Ok(())
    }

    fn end_element(&mut self) -> RunOutcome {
        let parent = self.parent().map(str::to_owned);
        let Some(name) = self.stack.pop() else {
            return RunOutcome::Complete;
        };

        match (name.as_str(), self.state) {
            (COORDINATES, ParserState::InRouteGeometry) => {
                self.state = ParserState::Idle;
                let text = std::mem::take(&mut self.geometry_text);
                let before = self.waypoints.len();
                let outcome = self.push_points(&text);
                if self.waypoints.len() > before {
                    self.placemark_has_route = true;
                }
                return outcome;
            },
            (NAME, _) if parent.as_deref() == Some(DOCUMENT) && self.name.is_none() => {
                self.name = take_field(&mut self.field_text);
            },
            (DESCRIPTION, _) => match parent.as_deref() {
                Some(DOCUMENT) if self.document_description.is_none() => {
                    self.document_description = take_field(&mut self.field_text);
                },
                Some(PLACEMARK) => {
                    self.placemark_description = take_field(&mut self.field_text);
                },
                _ => {},
            },
            (PLACEMARK, _) => {
                if self.placemark_has_route && self.route_description.is_none() {
                    self.route_description = self.placemark_description.take();
                }
            },
            _ => {},
        }
        self.field_text.clear();
        RunOutcome::Complete
    }

    /// Split a geometry run into points: whitespace between points, commas
    /// between `lon,lat[,alt]` fields
    ///
    /// Whitespace always separates points, even after a comma: `"1, 2,0"`
    /// yields the malformed token `1,` and the point `lon=2, lat=0`.
    fn push_points(&mut self, text: &str) -> RunOutcome {
        for token in text.split_whitespace() {
            match parse_point(token) {
                Some(point) => self.waypoints.push(point),
                None => match self.policy {
                    MalformedPointPolicy::Skip => {
                        debug!(%token, "Skipping malformed route point");
                    },
                    MalformedPointPolicy::Abort => {
                        warn!(
                            %token,
                            kept = self.waypoints.len(),
                            "Malformed route point, stopping route parse"
                        );
                        return RunOutcome::Aborted;
                    },
                },
            }
        }
        RunOutcome::Complete
    }

    fn end_document(&self) -> Result<(), RouteError> {
        if let Some(open) = self.stack.last() {
            return Err(RouteError::MalformedDocument(format!(
                "unexpected end of document inside <{open}>"
            )));
        }
        if !self.saw_root {
            return Err(RouteError::MalformedDocument(
                "document has no root element".to_string(),
            ));
        }
        Ok(())
    }

    fn finish(self) -> Route {
        debug!(waypoints = self.waypoints.len(), "Parsed route document");
        Route {
            name: self.name,
            description: self.route_description.or(self.document_description),
            waypoints: self.waypoints,
        }
    }
}

fn take_field(text: &mut String) -> Option<String> {
    let value = std::mem::take(text);
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse one `lon,lat[,alt]` token
fn parse_point(token: &str) -> Option<MicroPoint> {
    let mut fields = token.split(',');
    let lon: f64 = fields.next()?.trim().parse().ok()?;
    let lat: f64 = fields.next()?.trim().parse().ok()?;
    if let Some(alt) = fields.next() {
        alt.trim().parse::<f64>().ok()?;
    }
    if fields.next().is_some() {
        return None;
    }
    Coordinate::new(lat, lon).ok().map(MicroPoint::from)
}
