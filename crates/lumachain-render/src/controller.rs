//! Output controller: one physical chain of fixtures

use lumachain_core::{layout_chain, Fixture, Pixel, Protocol};
use tracing::{debug, info};

use crate::protocol::{encoder_for, PostAmble, ProtocolEncoder};
use crate::{FrameSink, OutputError, Result};

/// Owns the fixtures on one output line and drives the encoder.
///
/// Fixtures are packed in the order they were added. Adding or removing a
/// fixture marks the layout stale; nothing is added, removed, encoded or
/// started until [`Controller::recompute_chain`] has run.
pub struct Controller {
    name: String,
    protocol: Protocol,
    post_amble: PostAmble,
    encoder: Box<dyn ProtocolEncoder>,
    sink: Box<dyn FrameSink>,
    fixtures: Vec<Fixture>,
    total_pixels: usize,
    stale: bool,
    running: bool,
    chain: Vec<Pixel>,
    frame: Vec<u8>,
}

impl Controller {
    /// Create a stopped controller with no fixtures and no post-amble
    pub fn new(name: impl Into<String>, protocol: Protocol, sink: impl FrameSink + 'static) -> Self {
        Self {
            name: name.into(),
            protocol,
            post_amble: PostAmble::NONE,
            encoder: encoder_for(protocol, PostAmble::NONE),
            sink: Box::new(sink),
            fixtures: Vec::new(),
            total_pixels: 0,
            stale: false,
            running: false,
            chain: Vec::new(),
            frame: Vec::new(),
        }
    }

    /// Append trailing bytes after each frame
    pub fn with_post_amble(mut self, post_amble: PostAmble) -> Self {
        self.post_amble = post_amble;
        self.encoder = encoder_for(self.protocol, post_amble);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn post_amble(&self) -> PostAmble {
        self.post_amble
    }

    /// Add a fixture to the end of the chain and return its index.
    ///
    /// The layout is stale afterwards.
    pub fn add_fixture(&mut self, fixture: Fixture) -> Result<usize> {
        self.check_mutable()?;
        if let Some(fixture_protocol) = fixture.protocol() {
            if fixture_protocol != self.protocol {
                return Err(OutputError::ProtocolMismatch {
                    fixture: fixture.name().to_string(),
                    fixture_protocol,
                    controller_protocol: self.protocol,
                });
            }
        }

        info!(
            "Controller '{}': added fixture '{}' ({} pixels)",
            self.name,
            fixture.name(),
            fixture.pixel_count()
        );
        self.fixtures.push(fixture);
        self.stale = true;
        Ok(self.fixtures.len() - 1)
    }

    /// Remove a fixture; later fixtures shift down one index
    pub fn remove_fixture(&mut self, index: usize) -> Result<Fixture> {
        self.check_mutable()?;
        if index >= self.fixtures.len() {
            return Err(OutputError::FixtureNotFound(index));
        }
        let fixture = self.fixtures.remove(index);
        self.stale = true;
        info!(
            "Controller '{}': removed fixture '{}'",
            self.name,
            fixture.name()
        );
        Ok(fixture)
    }

    fn check_mutable(&self) -> Result<()> {
        if self.running {
            return Err(OutputError::ControllerRunning(self.name.clone()));
        }
        if self.stale {
            return Err(OutputError::StaleLayout);
        }
        Ok(())
    }

    /// Pack fixtures into contiguous chain offsets. Returns the chain length.
    pub fn recompute_chain(&mut self) -> usize {
        self.total_pixels = layout_chain(&mut self.fixtures);
        self.chain.clear();
        self.chain.resize(self.total_pixels, Pixel::OFF);
        self.stale = false;
        debug!(
            "Controller '{}': chain of {} fixtures, {} pixels",
            self.name,
            self.fixtures.len(),
            self.total_pixels
        );
        self.total_pixels
    }

    /// Whether fixtures changed since the last layout pass
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn fixtures(&self, index: usize) -> Option<&Fixture> {
        self.fixtures.get(index)
    }

    pub fn fixture_mut(&mut self, index: usize) -> Option<&mut Fixture> {
        self.fixtures.get_mut(index)
    }

    pub fn fixture_count(&self) -> usize {
        self.fixtures.len()
    }

    pub fn iter_fixtures(&self) -> impl Iterator<Item = &Fixture> {
        self.fixtures.iter()
    }

    /// Chain length as of the last layout pass
    pub fn total_pixels(&self) -> usize {
        self.total_pixels
    }

    /// Begin periodic output
    pub fn start(&mut self) -> Result<()> {
        if self.stale {
            return Err(OutputError::StaleLayout);
        }
        if !self.running {
            self.running = true;
            info!("Controller '{}' started ({})", self.name, self.protocol);
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            info!("Controller '{}' stopped", self.name);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn compose(&mut self) -> Result<()> {
        if self.stale {
            return Err(OutputError::StaleLayout);
        }
        for fixture in &self.fixtures {
            let offset = fixture.offset().ok_or(OutputError::StaleLayout)?;
            let end = offset + fixture.pixel_count();
            fixture.render_into(&mut self.chain[offset..end]);
        }
        Ok(())
    }

    /// Composite every fixture into chain order
    pub fn compose_chain(&mut self) -> Result<&[Pixel]> {
        self.compose()?;
        Ok(&self.chain)
    }

    /// Composite and encode one frame without sending it
    pub fn encode_frame(&mut self) -> Result<&[u8]> {
        self.compose()?;
        self.encoder.encode_into(&self.chain, &mut self.frame);
        Ok(&self.frame)
    }

    /// Composite, encode and transmit one frame. Returns the bytes sent.
    pub fn show(&mut self) -> Result<usize> {
        self.compose()?;
        self.encoder.encode_into(&self.chain, &mut self.frame);
        self.sink.write_frame(&self.frame)?;
        Ok(self.frame.len())
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.name)
            .field("protocol", &self.protocol)
            .field("fixtures", &self.fixtures.len())
            .field("total_pixels", &self.total_pixels)
            .field("stale", &self.stale)
            .field("running", &self.running)
            .finish()
    }
}
