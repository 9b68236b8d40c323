use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tutor", version, about = "Geofenced attendance for tuition-center tutors")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// The tutor's current position. Omit both to report no location fix.
#[derive(Args, Debug, Clone, Copy)]
pub struct Position {
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub lng: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Great-circle distance in meters between two points.
    Distance {
        #[arg(allow_negative_numbers = true)]
        from_lat: f64,
        #[arg(allow_negative_numbers = true)]
        from_lng: f64,
        #[arg(allow_negative_numbers = true)]
        to_lat: f64,
        #[arg(allow_negative_numbers = true)]
        to_lng: f64,
    },
    /// Evaluates eligibility locally without contacting the backend.
    Check {
        #[command(flatten)]
        position: Position,
        /// Evaluate at this RFC 3339 time instead of now.
        #[arg(long)]
        at: Option<String>,
    },
    /// Marks today's attendance. Ctrl-C cancels the attempt.
    Mark {
        #[command(flatten)]
        position: Position,
        /// Do not ask the backend whether today is already recorded first.
        #[arg(long)]
        skip_sync: bool,
    },
    /// Shows the attendance button status and today's record.
    Status,
    /// Checks connectivity, the app version and the effective policy.
    Diagnostics,
    /// Shows the latest announcement.
    Announcements {
        #[arg(long)]
        all: bool,
    },
    /// The tutor's students. Lists them when no subcommand is given.
    Students {
        #[command(subcommand)]
        command: Option<StudentCommands>,
    },
    /// Subject marks of a student.
    Marks {
        #[command(subcommand)]
        command: MarksCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum StudentCommands {
    List,
    /// Shows one student's record.
    Show { student_id: String },
    /// Edits a student's record. Fields not given keep their current value.
    Edit {
        student_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        father_name: Option<String>,
        #[arg(long)]
        contact: Option<String>,
        #[arg(long, value_parser = ["active", "inactive"])]
        status: Option<String>,
        #[arg(long)]
        medium: Option<String>,
        #[arg(long)]
        remarks: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum MarksCommands {
    List {
        student_id: String,
    },
    Add {
        student_id: String,
        subject_id: String,
        percentage: String,
        /// DD-MM-YY or YYYY-MM-DD.
        exam_date: String,
    },
    Update {
        student_id: String,
        subject_id: String,
        percentage: String,
        exam_date: String,
    },
    Delete {
        mark_id: String,
        subject_id: String,
    },
}
