//! In-memory stand-in for vehicle SSH servers
//!
//! `FakeConnector` hands out `FakeShell`s that share one `RemoteState`. The
//! shells interpret the exact commands the session layer sends, against a
//! single in-memory filesystem.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use vt_core::config::Settings;
use vt_core::traits::{Connector, PasswordPrompt, RemoteShell};
use vt_core::types::{CommandOutput, Credentials, Endpoint, PromptContext};
use vt_core::ConnectionError;
use vt_session::SessionManager;

pub const CONF: &str = "/opt/usr/app/1/gea/runtime_service/planning_exec/res/conf";
pub const CONTROL_CONF: &str = "/opt/usr/app/1/gea/runtime_service/control_exec/res/conf";

/// A connection attempt seen by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectAttempt {
    pub host: String,
    pub username: String,
    pub password: Option<String>,
    /// Jump host the attempt was tunnelled through
    pub via: Option<String>,
}

#[derive(Debug)]
pub struct RemoteState {
    /// Required password per host; hosts not listed accept anything
    pub passwords: HashMap<String, String>,
    pub unreachable: HashSet<String>,
    pub files: HashMap<String, String>,
    pub attempts: Vec<ConnectAttempt>,
    /// Live shells by id
    pub open: HashMap<usize, String>,
    /// `(host, command)` in execution order
    pub commands: Vec<(String, String)>,
    pub canary_reply: String,
    pub mount_fails: bool,
    /// Prepended to every `cat` output
    pub banner: Option<String>,
    /// `(command fragment, stderr)` pairs
    pub stderr_rules: Vec<(String, String)>,
    next_id: usize,
}

impl Default for RemoteState {
    fn default() -> Self {
        Self {
            passwords: HashMap::new(),
            unreachable: HashSet::new(),
            files: HashMap::new(),
            attempts: Vec::new(),
            open: HashMap::new(),
            commands: Vec::new(),
            canary_reply: "connection_test\n".to_string(),
            mount_fails: false,
            banner: None,
            stderr_rules: Vec::new(),
            next_id: 0,
        }
    }
}

/// Shared handle on the fake remote world
#[derive(Debug, Clone, Default)]
pub struct FakeRemote(Arc<Mutex<RemoteState>>);

impl FakeRemote {
    pub fn state(&self) -> MutexGuard<'_, RemoteState> {
        self.0.lock().unwrap()
    }

    pub fn require_password(&self, host: &str, password: &str) {
        self.state()
            .passwords
            .insert(host.to_string(), password.to_string());
    }

    pub fn put_file(&self, path: &str, content: &str) {
        self.state()
            .files
            .insert(path.to_string(), content.to_string());
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.state().files.get(path).cloned()
    }

    /// Hosts of the currently open shells, sorted
    pub fn open_hosts(&self) -> Vec<String> {
        let mut hosts: Vec<String> = self.state().open.values().cloned().collect();
        hosts.sort();
        hosts
    }

    pub fn attempts(&self) -> Vec<ConnectAttempt> {
        self.state().attempts.clone()
    }

    /// Commands sent to `host`
    pub fn commands_on(&self, host: &str) -> Vec<String> {
        self.state()
            .commands
            .iter()
            .filter(|(h, _)| h == host)
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn connector(&self) -> FakeConnector {
        FakeConnector {
            remote: self.clone(),
        }
    }

    fn open_shell(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
        via: Option<String>,
    ) -> Result<FakeShell, ConnectionError> {
        let mut state = self.state();
        state.attempts.push(ConnectAttempt {
            host: endpoint.host.clone(),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
            via,
        });

        if state.unreachable.contains(&endpoint.host) {
            return Err(ConnectionError::ConnectionRefused(endpoint.to_string()));
        }
        if let Some(required) = state.passwords.get(&endpoint.host) {
            if credentials.password.as_deref() != Some(required.as_str()) {
                return Err(ConnectionError::AuthenticationFailed);
            }
        }

        let id = state.next_id;
        state.next_id += 1;
        state.open.insert(id, endpoint.host.clone());
        Ok(FakeShell {
            id,
            host: endpoint.host.clone(),
            remote: self.clone(),
        })
    }
}

pub struct FakeConnector {
    remote: FakeRemote,
}

#[async_trait]
impl Connector for FakeConnector {
    type Shell = FakeShell;

    async fn connect(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<FakeShell, ConnectionError> {
        self.remote.open_shell(endpoint, credentials, None)
    }

    async fn connect_through(
        &self,
        jump: &FakeShell,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<FakeShell, ConnectionError> {
        if !self.remote.state().open.contains_key(&jump.id) {
            return Err(ConnectionError::TunnelError("jump host is closed".to_string()));
        }
        self.remote
            .open_shell(endpoint, credentials, Some(jump.host.clone()))
    }
}

pub struct FakeShell {
    id: usize,
    host: String,
    remote: FakeRemote,
}

#[async_trait]
impl RemoteShell for FakeShell {
    async fn exec(&self, command: &str) -> Result<CommandOutput, ConnectionError> {
        let mut state = self.remote.state();
        if !state.open.contains_key(&self.id) {
            return Err(ConnectionError::ConnectionLost(self.host.clone()));
        }
        state
            .commands
            .push((self.host.clone(), command.to_string()));

        let stderr = state
            .stderr_rules
            .iter()
            .find(|(fragment, _)| command.contains(fragment.as_str()))
            .map(|(_, stderr)| stderr.clone())
            .unwrap_or_default();

        let mut output = run(&mut state, command);
        if !stderr.is_empty() {
            output.stderr = stderr;
        }
        Ok(output)
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        self.remote.state().open.remove(&self.id);
        Ok(())
    }
}

fn run(state: &mut RemoteState, command: &str) -> CommandOutput {
    let quoted: Vec<&str> = command.split('\'').collect();
    let stdout = |s: String| CommandOutput {
        stdout: s,
        stderr: String::new(),
        exit_status: Some(0),
    };
    let stderr = |s: &str| CommandOutput {
        stdout: String::new(),
        stderr: s.to_string(),
        exit_status: Some(1),
    };

    if command == "echo \"connection_test\"" {
        return stdout(state.canary_reply.clone());
    }
    if command.starts_with("mount ") {
        return if state.mount_fails {
            stderr("mount: /opt/usr/app/1/gea: permission denied by policy")
        } else {
            stdout(String::new())
        };
    }
    if command.starts_with("test -f ") {
        let found = state.files.contains_key(quoted[1]);
        return stdout(if found { "OK\n" } else { "NO\n" }.to_string());
    }
    if command.ends_with("| wc -c") {
        return match state.files.get(quoted[1]) {
            Some(content) => stdout(format!("{}\n", content.len())),
            None => stderr("cat: No such file or directory"),
        };
    }
    if command.starts_with("cat ") {
        return match state.files.get(quoted[1]) {
            Some(content) => {
                let banner = state.banner.clone().unwrap_or_default();
                stdout(format!("{}{}", banner, content))
            }
            None => stderr("cat: No such file or directory"),
        };
    }
    if command.starts_with("echo '") {
        let decoded = STANDARD.decode(quoted[1]).unwrap();
        state
            .files
            .insert(quoted[9].to_string(), String::from_utf8(decoded).unwrap());
        return stdout(String::new());
    }
    if command.starts_with("pwd && whoami") {
        return stdout("/root\nroot\n".to_string());
    }
    stdout(String::new())
}

/// Prompt that returns a fixed answer and counts how often it was asked
#[derive(Clone)]
pub struct FixedPrompt {
    answers: Arc<Mutex<VecDeque<Option<String>>>>,
    calls: Arc<AtomicUsize>,
    pub contexts: Arc<Mutex<Vec<PromptContext>>>,
}

impl FixedPrompt {
    pub fn answering(answers: &[Option<&str>]) -> Self {
        Self {
            answers: Arc::new(Mutex::new(
                answers.iter().map(|a| a.map(str::to_string)).collect(),
            )),
            calls: Arc::new(AtomicUsize::new(0)),
            contexts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn never() -> Self {
        Self::answering(&[])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PasswordPrompt for FixedPrompt {
    fn prompt_password(&self, context: &PromptContext) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.contexts.lock().unwrap().push(context.clone());
        self.answers.lock().unwrap().pop_front().flatten()
    }
}

pub fn manager(remote: &FakeRemote, prompt: FixedPrompt) -> SessionManager<FakeConnector> {
    SessionManager::new(remote.connector(), Settings::default(), prompt)
}

pub fn manager_with(
    remote: &FakeRemote,
    prompt: FixedPrompt,
    settings: Settings,
) -> SessionManager<FakeConnector> {
    SessionManager::new(remote.connector(), settings, prompt)
}
