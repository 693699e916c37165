//! Test fakes for stages and collaborators.
//!
//! These are published (not `cfg(test)`) so downstream generators can
//! script their own pipelines in tests: a scripted interaction, a
//! recording command runner, an in-memory variable store with call
//! counters, and a static cloud provider.

use crate::cloud::{CloudProvider, TrustStack};
use crate::errors::{LaunchpadError, Result};
use crate::interact::Interaction;
use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use crate::remote::sync::{CreateOutcome, VariablePage, VariableSpec, VariableStore};
use crate::template::TemplateRenderer;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Interaction fake with queued answers and an emitted-line transcript.
#[derive(Debug, Default)]
pub struct ScriptedInteraction {
    confirms: Mutex<VecDeque<bool>>,
    inputs: Mutex<VecDeque<String>>,
    emitted: Mutex<Vec<String>>,
}

impl ScriptedInteraction {
    /// Creates an empty scripted interaction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an answer for the next `confirm` call.
    pub fn push_confirm(&self, answer: bool) {
        self.confirms.lock().push_back(answer);
    }

    /// Queues an answer for the next `input` call.
    pub fn push_input(&self, answer: impl Into<String>) {
        self.inputs.lock().push_back(answer.into());
    }

    /// Returns all emitted lines.
    #[must_use]
    pub fn emitted(&self) -> Vec<String> {
        self.emitted.lock().clone()
    }
}

#[async_trait]
impl Interaction for ScriptedInteraction {
    async fn confirm(&self, _message: &str, default: bool) -> Result<bool> {
        // Empty queue models the user accepting the default.
        Ok(self.confirms.lock().pop_front().unwrap_or(default))
    }

    async fn input(&self, message: &str, default: Option<&str>) -> Result<String> {
        if let Some(answer) = self.inputs.lock().pop_front() {
            return Ok(answer);
        }
        default.map(ToString::to_string).ok_or_else(|| {
            LaunchpadError::Prompt(format!("no scripted answer for '{message}'"))
        })
    }

    fn emit(&self, line: &str) {
        self.emitted.lock().push(line.to_string());
    }
}

/// Command runner that records every invocation instead of spawning.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    stdout_rules: Mutex<Vec<(String, String)>>,
    fail_always: Mutex<Vec<String>>,
    fail_once: Mutex<Vec<String>>,
}

impl RecordingRunner {
    /// Creates an empty recording runner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded command as `"program arg arg ..."`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|spec| format!("{} {}", spec.program, spec.args.join(" ")))
            .collect()
    }

    /// Returns the raw recorded specs.
    #[must_use]
    pub fn specs(&self) -> Vec<CommandSpec> {
        self.calls.lock().clone()
    }

    /// Makes commands whose rendered form contains `fragment` return
    /// `stdout`.
    pub fn stdout_for(&self, fragment: impl Into<String>, stdout: impl Into<String>) {
        self.stdout_rules.lock().push((fragment.into(), stdout.into()));
    }

    /// Makes every command containing `fragment` fail.
    pub fn fail_matching(&self, fragment: impl Into<String>) {
        self.fail_always.lock().push(fragment.into());
    }

    /// Makes the next command containing `fragment` fail, once.
    pub fn fail_once_matching(&self, fragment: impl Into<String>) {
        self.fail_once.lock().push(fragment.into());
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(
        &self,
        _interact: &dyn Interaction,
        spec: CommandSpec,
    ) -> Result<CommandOutput> {
        let rendered = format!("{} {}", spec.program, spec.args.join(" "));
        self.calls.lock().push(spec.clone());

        let mut fail_once = self.fail_once.lock();
        if let Some(position) = fail_once.iter().position(|f| rendered.contains(f.as_str())) {
            fail_once.remove(position);
            return Err(LaunchpadError::Process {
                program: spec.program,
                status: 1,
            });
        }
        drop(fail_once);

        if self
            .fail_always
            .lock()
            .iter()
            .any(|f| rendered.contains(f.as_str()))
        {
            return Err(LaunchpadError::Process {
                program: spec.program,
                status: 1,
            });
        }

        let stdout = self
            .stdout_rules
            .lock()
            .iter()
            .find(|(fragment, _)| rendered.contains(fragment.as_str()))
            .map(|(_, stdout)| stdout.clone())
            .unwrap_or_default();

        Ok(CommandOutput { stdout })
    }
}

type CreateFailure = Box<dyn Fn() -> LaunchpadError + Send + Sync>;

/// In-memory [`VariableStore`] with call counters for the synchronizer
/// property tests.
#[derive(Default)]
pub struct MemoryVariableStore {
    pages: Mutex<Vec<Vec<(String, String)>>>,
    list_calls: Mutex<usize>,
    create_calls: Mutex<usize>,
    update_calls: Mutex<usize>,
    conflict_id: Mutex<Option<String>>,
    conflict_after_first_id: Mutex<Option<String>>,
    create_failure: Mutex<Option<CreateFailure>>,
    listing_delay: Mutex<Option<Duration>>,
    last_update: Mutex<Option<(String, VariableSpec)>>,
}

impl MemoryVariableStore {
    /// Seeds the listing with one `(key, id)` entry.
    pub fn seed(&self, key: &str, id: &str) {
        let mut pages = self.pages.lock();
        if pages.is_empty() {
            pages.push(Vec::new());
        }
        pages[0].push((key.to_string(), id.to_string()));
    }

    /// Seeds a multi-page listing.
    pub fn seed_paged(&self, seeded: Vec<Vec<(&str, &str)>>) {
        *self.pages.lock() = seeded
            .into_iter()
            .map(|page| {
                page.into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .collect();
    }

    /// Makes every create report a conflict with `existing_id`.
    pub fn conflict_on_create(&self, existing_id: &str) {
        *self.conflict_id.lock() = Some(existing_id.to_string());
    }

    /// Makes creates after the first report a conflict with
    /// `existing_id`.
    pub fn conflict_on_second_create(&self, existing_id: &str) {
        *self.conflict_after_first_id.lock() = Some(existing_id.to_string());
    }

    /// Makes every create fail with the supplied error.
    pub fn fail_create_with<F>(&self, failure: F)
    where
        F: Fn() -> LaunchpadError + Send + Sync + 'static,
    {
        *self.create_failure.lock() = Some(Box::new(failure));
    }

    /// Delays each listing fetch, for in-flight sharing tests.
    pub fn delay_listing(&self, delay: Duration) {
        *self.listing_delay.lock() = Some(delay);
    }

    /// Number of listing fetches issued.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock()
    }

    /// Number of create calls issued.
    #[must_use]
    pub fn create_calls(&self) -> usize {
        *self.create_calls.lock()
    }

    /// Number of update calls issued.
    #[must_use]
    pub fn update_calls(&self) -> usize {
        *self.update_calls.lock()
    }

    /// Remote identifier targeted by the most recent update.
    #[must_use]
    pub fn last_update_id(&self) -> Option<String> {
        self.last_update.lock().as_ref().map(|(id, _)| id.clone())
    }

    /// Spec sent with the most recent update.
    #[must_use]
    pub fn last_update_spec(&self) -> Option<VariableSpec> {
        self.last_update.lock().as_ref().map(|(_, spec)| spec.clone())
    }
}

#[async_trait]
impl VariableStore for MemoryVariableStore {
    async fn list_page(&self, cursor: Option<&str>) -> Result<VariablePage> {
        let delay = *self.listing_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        *self.list_calls.lock() += 1;

        let pages = self.pages.lock();
        let index: usize = cursor.map_or(0, |c| c.parse().unwrap_or(0));
        let entries = pages.get(index).cloned().unwrap_or_default();
        let next = if index + 1 < pages.len() {
            Some((index + 1).to_string())
        } else {
            None
        };
        Ok(VariablePage { entries, next })
    }

    async fn create(&self, _spec: &VariableSpec) -> Result<CreateOutcome> {
        let mut calls = self.create_calls.lock();
        *calls += 1;
        let call_number = *calls;
        drop(calls);

        if let Some(failure) = self.create_failure.lock().as_ref() {
            return Err(failure());
        }
        if let Some(existing_id) = self.conflict_id.lock().clone() {
            return Ok(CreateOutcome::Conflict { existing_id });
        }
        if call_number > 1 {
            if let Some(existing_id) = self.conflict_after_first_id.lock().clone() {
                return Ok(CreateOutcome::Conflict { existing_id });
            }
        }
        Ok(CreateOutcome::Created)
    }

    async fn update(&self, id: &str, spec: &VariableSpec) -> Result<()> {
        *self.update_calls.lock() += 1;
        *self.last_update.lock() = Some((id.to_string(), spec.clone()));
        Ok(())
    }
}

/// Cloud provider fake with a fixed account and output map.
pub struct StaticCloudProvider {
    account_id: String,
    outputs: Mutex<HashMap<String, String>>,
    fail_identity: Mutex<bool>,
    calls: Mutex<Vec<String>>,
}

impl StaticCloudProvider {
    /// Creates a provider reporting `account_id` and a `RoleArn` output.
    #[must_use]
    pub fn new(account_id: impl Into<String>) -> Self {
        let mut outputs = HashMap::new();
        outputs.insert(
            "RoleArn".to_string(),
            "arn:aws:iam::123456789012:role/deploy".to_string(),
        );
        Self {
            account_id: account_id.into(),
            outputs: Mutex::new(outputs),
            fail_identity: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the declared stack outputs.
    pub fn set_outputs(&self, outputs: HashMap<String, String>) {
        *self.outputs.lock() = outputs;
    }

    /// Makes the identity check fail.
    pub fn fail_identity(&self) {
        *self.fail_identity.lock() = true;
    }

    /// Returns the recorded call log.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CloudProvider for StaticCloudProvider {
    async fn caller_account(&self, _interact: &dyn Interaction) -> Result<String> {
        self.calls.lock().push("caller_account".to_string());
        if *self.fail_identity.lock() {
            return Err(LaunchpadError::validation(
                "could not determine the AWS account id, have you configured AWS credentials?",
            ));
        }
        Ok(self.account_id.clone())
    }

    async fn bootstrap(
        &self,
        _interact: &dyn Interaction,
        account_id: &str,
        region: &str,
    ) -> Result<()> {
        self.calls
            .lock()
            .push(format!("bootstrap aws://{account_id}/{region}"));
        Ok(())
    }

    async fn deploy_trust_stack(
        &self,
        _interact: &dyn Interaction,
        stack: &TrustStack,
    ) -> Result<HashMap<String, String>> {
        self.calls.lock().push(format!(
            "deploy {} {} {} {}",
            stack.stack_name, stack.project, stack.repository_uuid, stack.region
        ));
        Ok(self.outputs.lock().clone())
    }
}

/// Template renderer fake recording expansion requests.
#[derive(Default)]
pub struct RecordingRenderer {
    calls: Mutex<Vec<(PathBuf, PathBuf, serde_json::Value)>>,
}

impl RecordingRenderer {
    /// Creates an empty recording renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns recorded `(source, destination, data)` expansions.
    #[must_use]
    pub fn calls(&self) -> Vec<(PathBuf, PathBuf, serde_json::Value)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TemplateRenderer for RecordingRenderer {
    async fn expand(
        &self,
        source: &Path,
        destination: &Path,
        data: &serde_json::Value,
    ) -> Result<()> {
        self.calls.lock().push((
            source.to_path_buf(),
            destination.to_path_buf(),
            data.clone(),
        ));
        Ok(())
    }
}
