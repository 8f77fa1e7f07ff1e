//! Action descriptors: the unit of work handed to the external executor.

use serde::{Deserialize, Serialize};

use crate::core::artifact::{Artifact, DepSet};

/// How an action is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Invocation {
    /// Run a program with an argument vector.
    Spawn {
        program: String,
        args: Vec<String>,
        env: Vec<(String, String)>,
    },
    /// Run an already-escaped command through the shell. Used when one
    /// action chains several tool invocations.
    Shell {
        command: String,
        env: Vec<(String, String)>,
    },
    /// Write fixed contents to the action's sole output.
    WriteFile { contents: String },
}

/// A tool invocation plus its declared inputs and outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDescriptor {
    /// Short category label, used for log filtering and coverage-metadata
    /// matching
    pub mnemonic: String,
    pub invocation: Invocation,
    pub inputs: Vec<Artifact>,
    pub outputs: Vec<Artifact>,
}

impl ActionDescriptor {
    /// The invocation's arguments flattened to strings, for inspection.
    pub fn arguments(&self) -> Vec<String> {
        match &self.invocation {
            Invocation::Spawn { program, args, .. } => {
                let mut out = Vec::with_capacity(args.len() + 1);
                out.push(program.clone());
                out.extend(args.iter().cloned());
                out
            }
            Invocation::Shell { command, .. } => vec![command.clone()],
            Invocation::WriteFile { .. } => Vec::new(),
        }
    }
}

/// Ordered list of registered actions for one unit.
#[derive(Debug, Default, Serialize)]
pub struct ActionGraph {
    actions: Vec<ActionDescriptor>,
}

impl ActionGraph {
    pub fn new() -> Self {
        ActionGraph::default()
    }

    pub fn register(&mut self, action: ActionDescriptor) {
        tracing::debug!(
            mnemonic = %action.mnemonic,
            outputs = action.outputs.len(),
            "registered action"
        );
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[ActionDescriptor] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Actions with the given mnemonic, in registration order.
    pub fn with_mnemonic<'a>(&'a self, mnemonic: &'a str) -> Vec<&'a ActionDescriptor> {
        self.actions
            .iter()
            .filter(|a| a.mnemonic == mnemonic)
            .collect()
    }

    /// The unique action producing an output, if registered.
    pub fn producer(&self, output: Artifact) -> Option<&ActionDescriptor> {
        self.actions.iter().find(|a| a.outputs.contains(&output))
    }
}

/// Builder assembling an action with deduplicated input/output sets.
pub struct ActionBuilder {
    mnemonic: &'static str,
    invocation: Invocation,
    inputs: Vec<Artifact>,
    outputs: Vec<Artifact>,
}

impl ActionBuilder {
    pub fn spawn(
        mnemonic: &'static str,
        program: impl Into<String>,
        args: Vec<String>,
        env: Vec<(String, String)>,
    ) -> Self {
        ActionBuilder {
            mnemonic,
            invocation: Invocation::Spawn {
                program: program.into(),
                args,
                env,
            },
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn shell(
        mnemonic: &'static str,
        command: impl Into<String>,
        env: Vec<(String, String)>,
    ) -> Self {
        ActionBuilder {
            mnemonic,
            invocation: Invocation::Shell {
                command: command.into(),
                env,
            },
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn write_file(mnemonic: &'static str, contents: impl Into<String>) -> Self {
        ActionBuilder {
            mnemonic,
            invocation: Invocation::WriteFile {
                contents: contents.into(),
            },
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn input(mut self, input: Artifact) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn inputs(mut self, inputs: impl IntoIterator<Item = Artifact>) -> Self {
        self.inputs.extend(inputs);
        self
    }

    pub fn transitive_inputs(mut self, inputs: &DepSet<Artifact>) -> Self {
        self.inputs.extend(inputs.to_vec());
        self
    }

    pub fn output(mut self, output: Artifact) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn outputs(mut self, outputs: impl IntoIterator<Item = Artifact>) -> Self {
        self.outputs.extend(outputs);
        self
    }

    /// Finish the descriptor, deduplicating declared files by identity
    /// while preserving first-seen order.
    pub fn build(self) -> ActionDescriptor {
        ActionDescriptor {
            mnemonic: self.mnemonic.to_string(),
            invocation: self.invocation,
            inputs: dedup(self.inputs),
            outputs: dedup(self.outputs),
        }
    }
}

fn dedup(artifacts: Vec<Artifact>) -> Vec<Artifact> {
    let mut seen = std::collections::HashSet::new();
    artifacts.into_iter().filter(|a| seen.insert(*a)).collect()
}
