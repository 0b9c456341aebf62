//! Interactive dashboard session
//!
//! Line-oriented replacement for a two-page web form: pick a role, then
//! act from that role's screen. Every action runs to completion before
//! the next prompt. A failed action is rendered and the session carries
//! on; only end of input or an I/O error ends it.

use crate::binding::ContractBinding;
use crate::gateway::ChainGateway;
use crate::patient::PatientDashboard;
use crate::provider::ProviderDashboard;
use crate::render::{self, ActionKind};
use crate::sections::{parse_selection, Section};
use crate::session::TxLog;
use crate::transaction::TransactionBuilder;
use crate::AccessError;
use colored::*;
use governance_validation::{
    parse_age, to_checksum, validate_registration, RegistrationField, RegistrationInput,
    ValidationError,
};
use std::io::{self, BufRead, Write};
use tracing::debug;

enum Screen {
    Stay,
    Back,
    /// Input closed
    Exit,
}

pub struct Console<'a, R: BufRead, W: Write> {
    gateway: &'a dyn ChainGateway,
    binding: &'a ContractBinding,
    builder: &'a TransactionBuilder,
    log: TxLog,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Console<'a, R, W> {
    pub fn new(
        gateway: &'a dyn ChainGateway,
        binding: &'a ContractBinding,
        builder: &'a TransactionBuilder,
        input: R,
        output: W,
    ) -> Self {
        Console {
            gateway,
            binding,
            builder,
            log: TxLog::new(),
            input,
            output,
        }
    }

    /// Transactions recorded so far in this session
    pub fn log(&self) -> &TxLog {
        &self.log
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until the user quits or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output)?;
            writeln!(self.output, "{}", "Select Role".bold())?;
            writeln!(self.output, "  [1] Patient")?;
            writeln!(self.output, "  [2] Provider")?;
            writeln!(self.output, "  [q] Quit")?;

            let Some(choice) = self.prompt("> ")? else {
                return Ok(());
            };
            let screen = match choice.trim().to_ascii_lowercase().as_str() {
                "1" | "patient" => self.patient_screen()?,
                "2" | "provider" => self.provider_screen()?,
                "q" | "quit" => return Ok(()),
                "" => continue,
                other => {
                    self.say(&render::error(&format!("unknown choice {:?}", other)))?;
                    continue;
                }
            };
            if let Screen::Exit = screen {
                return Ok(());
            }
        }
    }

    // =========================================================================
    // Patient
    // =========================================================================

    fn patient_screen(&mut self) -> io::Result<Screen> {
        writeln!(self.output, "{}", render::heading("PATIENT DASHBOARD"))?;
        writeln!(
            self.output,
            "Your Ethereum Address (Sender): {}",
            to_checksum(&self.builder.sender()).cyan()
        )?;

        loop {
            writeln!(self.output)?;
            writeln!(self.output, "  [1] Register")?;
            writeln!(self.output, "  [2] Grant Access")?;
            writeln!(self.output, "  [3] Transaction Log")?;
            writeln!(self.output, "  [b] Back")?;

            let Some(choice) = self.prompt("patient> ")? else {
                return Ok(Screen::Exit);
            };
            let next = match choice.trim().to_ascii_lowercase().as_str() {
                "1" | "register" => self.register()?,
                "2" | "grant" => self.grant_access()?,
                "3" | "log" => {
                    let text = render::tx_log(&self.log);
                    self.say(&text)?;
                    Screen::Stay
                }
                "b" | "back" => Screen::Back,
                "" => Screen::Stay,
                other => {
                    self.say(&render::error(&format!("unknown choice {:?}", other)))?;
                    Screen::Stay
                }
            };
            match next {
                Screen::Stay => {}
                done => return Ok(done),
            }
        }
    }

    fn register(&mut self) -> io::Result<Screen> {
        let mut raw = Vec::with_capacity(RegistrationField::ALL.len());
        for field in RegistrationField::ALL {
            match self.prompt(&format!("  {}: ", field.label()))? {
                Some(value) => raw.push(value),
                None => return Ok(Screen::Exit),
            }
        }

        let input = match form_input(&raw) {
            Ok(input) => input,
            Err(e) => {
                let text = self.failure(ActionKind::Register, e.into());
                self.say(&text)?;
                return Ok(Screen::Stay);
            }
        };

        let dashboard = PatientDashboard::new(self.gateway, self.binding, self.builder);
        let text = match dashboard.register(&input, &mut self.log) {
            Ok(receipt) => render::registered(&receipt),
            Err(e) => self.failure(ActionKind::Register, e),
        };
        self.say(&text)?;
        Ok(Screen::Stay)
    }

    fn grant_access(&mut self) -> io::Result<Screen> {
        let Some(provider) = self.prompt("  Provider Ethereum Address to Grant Access: ")? else {
            return Ok(Screen::Exit);
        };
        writeln!(self.output, "  Sections:")?;
        for section in Section::ALL {
            writeln!(self.output, "    [{}] {}", section.index(), section.label())?;
        }
        let Some(selection) = self.prompt("  Select sections (comma separated): ")? else {
            return Ok(Screen::Exit);
        };

        let sections = match parse_selection(&selection) {
            Ok(sections) => sections,
            Err(e) => {
                let text = self.failure(ActionKind::GrantAccess, e.into());
                self.say(&text)?;
                return Ok(Screen::Stay);
            }
        };

        let dashboard = PatientDashboard::new(self.gateway, self.binding, self.builder);
        let text = match dashboard.grant_access(&provider, &sections, &mut self.log) {
            Ok(report) => render::grant_report(&report),
            Err(e) => self.failure(ActionKind::GrantAccess, e),
        };
        self.say(&text)?;
        Ok(Screen::Stay)
    }

    // =========================================================================
    // Provider
    // =========================================================================

    fn provider_screen(&mut self) -> io::Result<Screen> {
        writeln!(self.output, "{}", render::heading("PROVIDER DASHBOARD"))?;

        loop {
            writeln!(self.output)?;
            writeln!(self.output, "  [1] Check Access")?;
            writeln!(self.output, "  [b] Back")?;

            let Some(choice) = self.prompt("provider> ")? else {
                return Ok(Screen::Exit);
            };
            match choice.trim().to_ascii_lowercase().as_str() {
                "1" | "check" => {
                    if let Screen::Exit = self.check_access()? {
                        return Ok(Screen::Exit);
                    }
                }
                "b" | "back" => return Ok(Screen::Back),
                "" => {}
                other => self.say(&render::error(&format!("unknown choice {:?}", other)))?,
            }
        }
    }

    fn check_access(&mut self) -> io::Result<Screen> {
        let Some(patient) = self.prompt("  Patient Ethereum Address: ")? else {
            return Ok(Screen::Exit);
        };
        let Some(provider) = self.prompt("  Your Provider Ethereum Address: ")? else {
            return Ok(Screen::Exit);
        };

        let dashboard = ProviderDashboard::new(self.gateway, self.binding);
        let text = match dashboard.check_access(&patient, &provider) {
            Ok(check) => render::access_check(&check),
            Err(e) => self.failure(ActionKind::CheckAccess, e),
        };
        self.say(&text)?;
        Ok(Screen::Stay)
    }

    // =========================================================================
    // I/O
    // =========================================================================

    fn failure(&self, action: ActionKind, err: AccessError) -> String {
        debug!(?action, error = %err, "action failed");
        render::action_error(action, &err, self.binding.address())
    }

    fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)
    }

    /// `None` once input is exhausted
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

/// Form values in `RegistrationField::ALL` order. A blank age is reported
/// together with any other blank field.
fn form_input(raw: &[String]) -> Result<RegistrationInput, ValidationError> {
    let field = |i: usize| raw.get(i).cloned().unwrap_or_default();
    let mut input = RegistrationInput {
        patient_id: field(0),
        name: field(1),
        age: 0,
        gender: field(3),
        physical_address: field(4),
        phone: field(5),
        email: field(6),
    };

    match parse_age(&field(2)) {
        Ok(age) => {
            input.age = age;
            Ok(input)
        }
        Err(ValidationError::BlankFields(_)) => match validate_registration(&input) {
            Err(ValidationError::BlankFields(mut blank)) => {
                let at = blank
                    .iter()
                    .position(|f| *f != RegistrationField::PatientId && *f != RegistrationField::Name)
                    .unwrap_or(blank.len());
                blank.insert(at, RegistrationField::Age);
                Err(ValidationError::BlankFields(blank))
            }
            _ => Err(ValidationError::BlankFields(vec![RegistrationField::Age])),
        },
        Err(e) => Err(e),
    }
}
