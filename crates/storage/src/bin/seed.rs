use std::fmt;

use chrono::{DateTime, Duration, Utc};
use quiz_core::model::{
    AnswerRecord, AttemptSummary, ContentRef, Question, QuizMeta, Selection,
};
use storage::repository::{QuestionSet, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    attempts: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidAttempts { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidAttempts { raw } => write!(f, "invalid --attempts value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite://quiz.sqlite3?mode=rwc".into());
        let mut attempts = std::env::var("QUIZ_SEED_ATTEMPTS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(2);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--attempts" => {
                    let value = require_value(&mut args, "--attempts")?;
                    attempts = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidAttempts { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            attempts,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://quiz.sqlite3?mode=rwc)");
    eprintln!("  --attempts <n>            Sample attempts to append for conference:1 (default: 2)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL, QUIZ_SEED_ATTEMPTS");
}

const RENAL_QUIZ: [(&str, &str, [&str; 4], usize); 10] = [
    (
        "q1",
        "Which organ is primarily discussed in the Renal Transplantation program?",
        ["Heart", "Lungs", "Kidney", "Liver"],
        2,
    ),
    (
        "q2",
        "Which specialist typically performs a renal transplant?",
        ["Cardiologist", "Transplant Surgeon", "Dermatologist", "Pulmonologist"],
        1,
    ),
    (
        "q3",
        "Which of the following is a common immunosuppressant drug used after transplant?",
        ["Aspirin", "Tacrolimus", "Metformin", "Amoxicillin"],
        1,
    ),
    (
        "q4",
        "What is the primary goal of transplantation surgery?",
        ["Cosmetic improvement", "Restore organ function", "Weight loss", "Pain relief"],
        1,
    ),
    (
        "q5",
        "Which laboratory test monitors kidney function after transplant?",
        ["HbA1c", "Serum creatinine", "LFTs", "Lipid profile"],
        1,
    ),
    (
        "q6",
        "Cold ischemia time refers to:",
        [
            "Time the organ is warm outside the body",
            "Time the organ is preserved on ice before transplant",
            "Operation duration",
            "Time until first dose of antibiotics",
        ],
        1,
    ),
    (
        "q7",
        "Which imaging is commonly used to evaluate living donor kidneys pre-op?",
        ["Chest X-ray", "CT angiography", "Brain MRI", "DEXA scan"],
        1,
    ),
    (
        "q8",
        "A common early post-transplant complication is:",
        ["Graft rejection", "Diabetes mellitus type 2", "Chronic arthritis", "Myopia"],
        0,
    ),
    (
        "q9",
        "Which blood group compatibility is important for kidney transplant?",
        ["ABO", "Rh only", "None", "HLA only"],
        0,
    ),
    (
        "q10",
        "What is the purpose of induction therapy after transplant?",
        [
            "Prevent infection",
            "Provide pain relief",
            "Strong early immune suppression to prevent rejection",
            "Improve blood pressure",
        ],
        2,
    ),
];

fn renal_questions() -> Result<Vec<Question>, quiz_core::Error> {
    let mut out = Vec::with_capacity(RENAL_QUIZ.len());
    for (id, prompt, options, correct) in RENAL_QUIZ {
        let options = options.iter().map(|o| (*o).to_string()).collect();
        out.push(Question::new(id, prompt, options, correct)?);
    }
    Ok(out)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let renal = ContentRef::conference(1);
    let questions = renal_questions()?;
    let set = QuestionSet::new(renal, QuizMeta::with_per_question_secs(30), questions.clone());
    storage.catalog.upsert_question_set(&set).await?;

    // Other conferences are listed but have no questions yet.
    for (id, secs) in [(2, 20), (3, 30), (4, 30), (5, 30)] {
        let empty = QuestionSet::new(
            ContentRef::conference(id),
            QuizMeta::with_per_question_secs(secs),
            Vec::new(),
        );
        storage.catalog.upsert_question_set(&empty).await?;
    }

    let workshop = QuestionSet::new(
        ContentRef::workshop(1),
        QuizMeta {
            per_question_secs: Some(30),
            duration_minutes: Some(5),
        },
        questions.iter().take(5).cloned().collect(),
    );
    storage.catalog.upsert_question_set(&workshop).await?;

    for i in 0..args.attempts {
        let started_at = now - Duration::days(i64::from(i) * 2) - Duration::minutes(10);
        let completed_at = started_at + Duration::minutes(4);
        let answers: Vec<AnswerRecord> = questions
            .iter()
            .enumerate()
            .map(|(n, q)| {
                let selection = if n % 3 == 0 {
                    Selection::Skipped
                } else {
                    Selection::Selected(q.correct_index())
                };
                AnswerRecord::for_question(q, selection)
            })
            .collect();
        let score = quiz_core::scoring::score(&answers);
        let total = u32::try_from(answers.len())?;
        let summary =
            AttemptSummary::from_persisted(renal, started_at, completed_at, score, total, answers)?;
        let _ = storage.attempts.append_attempt(&summary).await?;
    }

    println!(
        "Seeded {} question sets and {} attempts into {}",
        storage.catalog.list_contents().await?.len(),
        args.attempts,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
