//! Runtime call-stack tracking for generated programs.
//!
//! Generated code calls [`StackManager::push_stack`] on function entry,
//! [`StackManager::pop_stack`] on exit, [`StackManager::check_stack_overflow`]
//! before each call, and [`StackManager::check_zero_division`] before integer
//! division and modulo. The manager keeps one [`Location`] per live frame and
//! the text of every registered source file, so runtime errors can render a
//! multi-frame trace with source excerpts.

use std::fmt;

use crate::parse::Location;

/// Maximum number of live call frames before a recursion error is raised.
pub const MAX_CALL_DEPTH: usize = 200;

/// Number of innermost frames shown in a rendered trace.
const TRACE_FRAMES: usize = 4;

/// Tracks the call stack of a running program across all its source files.
///
/// One manager serves a whole session: every compiled file registers its
/// source with [`Self::add_source`] and bakes the returned id into its
/// `push_stack` call sites, so frames from different files resolve against
/// the right text.
#[derive(Debug, Default)]
pub struct StackManager {
    sources: Vec<String>,
    call_stack: Vec<Location>,
}

impl StackManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a source file and returns its id, to be used as the
    /// `file_id` of every location in code compiled from it.
    ///
    /// Ids are consecutive from zero in registration order.
    pub fn add_source(&mut self, source: String) -> u32 {
        self.sources.push(source);
        (self.sources.len() - 1) as u32
    }

    /// Records a new call frame at the call site's location.
    pub fn push_stack(&mut self, line: u32, col: u32, length: u32, file_id: u32) {
        self.call_stack.push(Location {
            line,
            col,
            length,
            file_id,
        });
    }

    /// Discards the innermost frame. Popping an empty stack is a no-op.
    pub fn pop_stack(&mut self) {
        self.call_stack.pop();
    }

    /// Current number of live frames.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Fails with [`RuntimeError::Recursion`] when the stack has reached
    /// [`MAX_CALL_DEPTH`] frames.
    ///
    /// Generated code invokes this before every call, so the check fires on
    /// the call that would create frame 201.
    pub fn check_stack_overflow(&self) -> Result<(), RuntimeError> {
        if self.call_stack.len() >= MAX_CALL_DEPTH {
            return Err(RuntimeError::Recursion {
                frames: self.call_stack.clone(),
                sources: self.sources.clone(),
                trace: self.render_trace(),
            });
        }
        Ok(())
    }

    /// Fails with [`RuntimeError::ZeroDivision`] when the denominator is
    /// zero.
    pub fn check_zero_division(&self, denominator: i64) -> Result<(), RuntimeError> {
        if denominator == 0 {
            return Err(RuntimeError::ZeroDivision {
                frames: self.call_stack.clone(),
                sources: self.sources.clone(),
            });
        }
        Ok(())
    }

    /// Renders the innermost frames of the stack, one `line N in <caller>`
    /// header plus an indented source excerpt per frame.
    ///
    /// The caller label of the first rendered frame is `main` when the whole
    /// stack fits, or `...` when older frames were elided; after that each
    /// frame is attributed to the excerpt of the frame above it.
    #[must_use]
    pub fn render_trace(&self) -> String {
        let mut out = String::new();
        let elided = self.call_stack.len() > TRACE_FRAMES;
        let mut previous = if elided { "..." } else { "main" }.to_owned();
        let first = self.call_stack.len().saturating_sub(TRACE_FRAMES);
        for frame in &self.call_stack[first..] {
            out.push_str(&format!("line {} in {previous}\n", frame.line));
            previous = self.frame_excerpt(frame);
            out.push_str(&format!("\t{previous}\n"));
        }
        out
    }

    /// The source text the frame's location spans, or the empty string when
    /// the location does not resolve (unknown file, line, or range).
    fn frame_excerpt(&self, frame: &Location) -> String {
        let Some(source) = self.sources.get(frame.file_id as usize) else {
            return String::new();
        };
        let Some(line) = source.lines().nth((frame.line as usize).saturating_sub(1)) else {
            return String::new();
        };
        let from = (frame.col as usize).saturating_sub(1);
        let to = (from + frame.length as usize).min(line.len());
        line.get(from..to).unwrap_or("").to_owned()
    }
}

/// Errors raised by the runtime checks of [`StackManager`].
///
/// Both variants carry a snapshot of the call stack and the source table
/// taken at raise time, so later pushes and pops do not change what an error
/// reports.
#[derive(Debug, Clone)]
pub enum RuntimeError {
    /// The recursion bound was hit. `trace` is pre-rendered at raise time.
    Recursion {
        frames: Vec<Location>,
        sources: Vec<String>,
        trace: String,
    },
    /// Integer division or modulo by zero.
    ZeroDivision {
        frames: Vec<Location>,
        sources: Vec<String>,
    },
}

impl RuntimeError {
    /// The call-stack snapshot taken when the error was raised.
    #[must_use]
    pub fn frames(&self) -> &[Location] {
        match self {
            Self::Recursion { frames, .. } | Self::ZeroDivision { frames, .. } => frames,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recursion { trace, .. } => {
                write!(f, "maximum recursion depth exceeded\n{trace}")
            }
            Self::ZeroDivision { .. } => write!(f, "division by zero"),
        }
    }
}

impl std::error::Error for RuntimeError {}
