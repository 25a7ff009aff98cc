//! recon-ng workflow driver.
//!
//! Sequences the remote recon-ng CLI for one workspace: add every target
//! domain, run the discovery modules in a fixed order, then delete result rows
//! that never resolved to an IP address. Steps run strictly one after another.
//!
//! Each command's exit status is checked. A non-zero status aborts the run
//! unless `continue_on_error` is configured, in which case the failure is
//! reported and the remaining steps still execute.

use crate::error::{BountyError, Result};
use crate::remote::CommandRunner;

/// Path of the recon-ng CLI on the droplet, relative to root's home.
const RECON_CLI: &str = "./recon-ng/recon-cli";

/// Discovery modules, in execution order. Host-to-host resolution runs last
/// so it sees every hostname the earlier modules found.
pub const RECON_MODULES: [&str; 7] = [
    "recon/domains-hosts/google_site_web",
    "recon/domains-hosts/brute_hosts",
    "recon/domains-hosts/bing_domain_web",
    "recon/domains-hosts/hackertarget",
    "recon/domains-hosts/ssl_san",
    "recon/domains-hosts/threatcrowd",
    "recon/hosts-hosts/resolve",
];

/// What to do when a remote command exits non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnError {
    /// Stop the run and surface the failure.
    Abort,
    /// Report the failure and keep going.
    Continue,
}

impl OnError {
    pub fn from_continue_flag(continue_on_error: bool) -> Self {
        if continue_on_error {
            OnError::Continue
        } else {
            OnError::Abort
        }
    }
}

/// The `add domains <domain>` command for `workspace`.
pub fn add_domain_command(workspace: &str, domain: &str) -> String {
    format!(
        "{} -w {} -C \"add domains {}\"",
        RECON_CLI, workspace, domain
    )
}

/// The module execution command for `workspace`.
pub fn module_command(workspace: &str, module: &str) -> String {
    format!("{} -w {} -m \"{}\" -x", RECON_CLI, workspace, module)
}

/// The cleanup command pruning hosts that never resolved.
pub fn cleanup_command(workspace: &str) -> String {
    format!(
        "{} -w {} -C \"query delete from hosts where ip_address is null\"",
        RECON_CLI, workspace
    )
}

/// Run the full workflow for `workspace` against `domains`.
pub fn run(
    runner: &dyn CommandRunner,
    workspace: &str,
    domains: &[String],
    on_error: OnError,
) -> Result<()> {
    for domain in domains {
        println!("[*] Adding domain: {}", domain);
        checked_run(runner, &add_domain_command(workspace, domain), on_error)?;
    }

    for module in RECON_MODULES {
        println!("[*] Executing recon-ng module: {}", module);
        checked_run(runner, &module_command(workspace, module), on_error)?;
    }

    println!("[*] Removing hosts without IP addresses from the remote DB...");
    checked_run(runner, &cleanup_command(workspace), on_error)?;

    Ok(())
}

fn checked_run(runner: &dyn CommandRunner, command: &str, on_error: OnError) -> Result<()> {
    let output = runner.run_command(command)?;
    if output.success() {
        return Ok(());
    }

    match on_error {
        OnError::Abort => Err(BountyError::remote_command_error(
            command,
            output.exit_status,
        )),
        OnError::Continue => {
            log::warn!(
                "`{}` exited with status {}; continuing",
                command,
                output.exit_status
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::CommandOutput;
    use std::cell::RefCell;

    /// Recorder that logs every command and answers with scripted statuses.
    struct Recorder {
        commands: RefCell<Vec<String>>,
        fail_matching: Option<&'static str>,
    }

    impl Recorder {
        fn new() -> Self {
            Recorder {
                commands: RefCell::new(Vec::new()),
                fail_matching: None,
            }
        }

        fn failing_on(fragment: &'static str) -> Self {
            Recorder {
                commands: RefCell::new(Vec::new()),
                fail_matching: Some(fragment),
            }
        }
    }

    impl CommandRunner for Recorder {
        fn run_command(&self, command: &str) -> Result<CommandOutput> {
            self.commands.borrow_mut().push(command.to_string());
            let failed = self
                .fail_matching
                .map(|fragment| command.contains(fragment))
                .unwrap_or(false);
            Ok(CommandOutput {
                exit_status: if failed { 1 } else { 0 },
                stderr: String::new(),
            })
        }
    }

    fn domains(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn every_domain_is_submitted_exactly_once_and_in_order() {
        let recorder = Recorder::new();
        run(
            &recorder,
            "acme",
            &domains(&["a.example.com", "b.example.com"]),
            OnError::Abort,
        )
        .unwrap();

        let commands = recorder.commands.borrow();
        // 2 domain adds + 7 modules + 1 cleanup
        assert_eq!(commands.len(), 10);
        assert_eq!(
            commands[0],
            "./recon-ng/recon-cli -w acme -C \"add domains a.example.com\""
        );
        assert_eq!(
            commands[1],
            "./recon-ng/recon-cli -w acme -C \"add domains b.example.com\""
        );
        assert_eq!(
            commands
                .iter()
                .filter(|command| command.contains("add domains a.example.com"))
                .count(),
            1
        );
        assert!(commands[9].contains("delete from hosts where ip_address is null"));
    }

    #[test]
    fn modules_run_in_the_fixed_order() {
        let recorder = Recorder::new();
        run(&recorder, "acme", &domains(&[]), OnError::Abort).unwrap();

        let commands = recorder.commands.borrow();
        for (index, module) in RECON_MODULES.iter().enumerate() {
            assert_eq!(
                commands[index],
                format!("./recon-ng/recon-cli -w acme -m \"{}\" -x", module)
            );
        }
    }

    #[test]
    fn failed_module_aborts_the_run() {
        let recorder = Recorder::failing_on("brute_hosts");
        let error = run(&recorder, "acme", &domains(&[]), OnError::Abort).unwrap_err();

        assert!(matches!(error, BountyError::RemoteCommandError(_)));
        // google_site_web succeeded, brute_hosts failed, nothing after ran.
        assert_eq!(recorder.commands.borrow().len(), 2);
    }

    #[test]
    fn continue_on_error_runs_every_step() {
        let recorder = Recorder::failing_on("brute_hosts");
        run(&recorder, "acme", &domains(&["a.example.com"]), OnError::Continue).unwrap();

        assert_eq!(recorder.commands.borrow().len(), 9);
    }
}
