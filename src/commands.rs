//! Prefix command parsing and the instruction text each command sends.

/// Acknowledgement sent after a channel's memory is cleared.
pub const RESET_ACK: &str = "🧠 Minne for denne kanalen er nullstilt.";

const INTERVIEW_GUIDE_INSTRUCTION: &str = "Lag en kort intervjuguide (10–15 spørsmål) til en casebedrift. \
    Dekke: strategi/verdiforslag, organisering/ledelse, kultur/endringsvilje, \
    dagens arbeidsprosesser (som kan digitaliseres), gevinst/tap for ulike aktører, \
    grønn omstilling. Nummerer og grupper i temaer.";

const ANALYSE_INSTRUCTION: &str = "Oppsummer og analyser teksten under i punktform for Oppgave 2. \
    1) Nøkkelfakta (strategi, organisering, kultur, prosesser) \
    2) Mulige digitaliseringstiltak (+ påvirkede roller) \
    3) Mulig effekt på grønt skifte \
    4) Åpne spørsmål til videre intervju.";

const TECHNOLOGY_INSTRUCTION: &str = "Lag en konsis beskrivelse av en ny digital teknologi for casebedriften: \
    Hva det er, hvordan den virker, hvilke behov den løser, krav til innføring, \
    kost/nytte, risiko, KPI-er, og hvordan den kan bidra til grønn omstilling. ";

const SPGR_INSTRUCTION: &str = "Med utgangspunkt i følgende SPGR-status/funn, gi: \
    1) Sannsynlige styrker/svakheter i gruppen \
    2) Konkrete tiltak (atferd/struktur/verktøy) \
    3) Hvordan måle effekt i SPGR II \
    4) Risikoer og mottiltak.";

/// A recognised user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `ask <text>`: free question, sent verbatim.
    Ask(String),
    /// `intervjuguide [topic]`
    InterviewGuide(Option<String>),
    /// `analyse <text>`
    Analyse(String),
    /// `teknologi <description>`
    Technology(String),
    /// `spgr <findings>`
    Spgr(String),
    /// `reset`: clear this channel's memory.
    Reset,
    /// `hei`
    Greet,
    /// `hjelp`
    Help,
}

/// Result of parsing one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Command(Command),
    /// A known command was used without its required argument.
    MissingArgument { name: &'static str },
    /// Not addressed to the bot.
    Ignored,
}

impl Command {
    /// Parse `content` as `<prefix><name> [argument]`.
    pub fn parse(content: &str, prefix: &str) -> ParseOutcome {
        let Some(rest) = content.trim_start().strip_prefix(prefix) else {
            return ParseOutcome::Ignored;
        };

        let (name, argument) = match rest.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (rest, ""),
        };
        let argument = (!argument.is_empty()).then(|| argument.to_string());

        match name {
            "ask" => required("ask", argument, Command::Ask),
            "intervjuguide" => ParseOutcome::Command(Command::InterviewGuide(argument)),
            "analyse" => required("analyse", argument, Command::Analyse),
            "teknologi" => required("teknologi", argument, Command::Technology),
            "spgr" => required("spgr", argument, Command::Spgr),
            "reset" => ParseOutcome::Command(Command::Reset),
            "hei" => ParseOutcome::Command(Command::Greet),
            "hjelp" => ParseOutcome::Command(Command::Help),
            _ => ParseOutcome::Ignored,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Ask(_) => "ask",
            Command::InterviewGuide(_) => "intervjuguide",
            Command::Analyse(_) => "analyse",
            Command::Technology(_) => "teknologi",
            Command::Spgr(_) => "spgr",
            Command::Reset => "reset",
            Command::Greet => "hei",
            Command::Help => "hjelp",
        }
    }

    /// The user-turn text this command submits to the model, or `None` for
    /// commands that never call the model.
    pub fn instruction(&self) -> Option<String> {
        match self {
            Command::Ask(question) => Some(question.clone()),
            Command::InterviewGuide(topic) => {
                let mut instruction = INTERVIEW_GUIDE_INSTRUCTION.to_string();
                if let Some(topic) = topic {
                    instruction.push_str(&format!(" Bransje/tema: {topic}."));
                }
                Some(instruction)
            }
            Command::Analyse(text) => Some(format!("{ANALYSE_INSTRUCTION}\n\nTEKST:\n{text}")),
            Command::Technology(description) => Some(format!(
                "{TECHNOLOGY_INSTRUCTION}\nTeknologivalg/kontekst: {description}"
            )),
            Command::Spgr(findings) => {
                Some(format!("{SPGR_INSTRUCTION}\n\nSPGR-funn/tekst: {findings}"))
            }
            Command::Reset | Command::Greet | Command::Help => None,
        }
    }
}

fn required(
    name: &'static str,
    argument: Option<String>,
    build: fn(String) -> Command,
) -> ParseOutcome {
    match argument {
        Some(argument) => ParseOutcome::Command(build(argument)),
        None => ParseOutcome::MissingArgument { name },
    }
}

/// Fixed greeting for `hei`.
pub fn greeting(prefix: &str) -> String {
    format!("Hei! Jeg er gruppens KI-medlem 🤖 Skriv {prefix}ask <spørsmål> for å starte.")
}

/// Command overview for `hjelp`.
pub fn help_text(prefix: &str) -> String {
    format!(
        "Kommandoer: {prefix}ask <spm>, {prefix}intervjuguide [tema], {prefix}analyse <tekst>, \
         {prefix}teknologi <beskrivelse>, {prefix}spgr <status>, {prefix}reset"
    )
}

/// One-line usage hint for a command used without its argument.
pub fn usage(name: &str, prefix: &str) -> String {
    let argument = match name {
        "ask" => "<spørsmål>",
        "analyse" => "<tekst/utdrag>",
        "teknologi" => "<kort hva/hvorfor>",
        "spgr" => "<kort om testfunn/status>",
        _ => "",
    };
    format!("Bruk: {prefix}{name} {argument}").trim_end().to_string()
}
