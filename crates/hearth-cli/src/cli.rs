use clap::{Args, Parser, Subcommand};
use hearth_core::models::TaskPriority;
use hearth_core::recurrence::{DayOfWeek, LegacyPattern, RecurrenceUnit};

/// Hearth: a shared household task list with recurring chores
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a new task
    Add(AddCommand),
    /// List tasks
    #[command(alias = "ls")]
    List(ListCommand),
    /// Show one task with its assignees, comments and series
    Show(ShowCommand),
    /// Mark a task as completed
    #[command(alias = "do")]
    Done(DoneCommand),
    /// Reopen a completed task
    Undo(UndoCommand),
    /// Delete a task
    #[command(alias = "rm")]
    Delete(DeleteCommand),
    /// Edit a task
    Edit(EditCommand),
    /// Manage household members
    Person(PersonCommand),
    /// Manage categories
    Category(CategoryCommand),
    /// Record a file attached to a task
    Attach(AttachCommand),
    /// Comment on tasks
    Comment(CommentCommand),
}

/// Recurrence flags shared by `add` and `edit`
#[derive(Args, Debug, Clone, Default)]
pub struct RecurrenceArgs {
    /// Repeat every N units (day, week, month, year, weekday)
    #[arg(long, conflicts_with_all = ["on", "repeat"])]
    pub every: Option<RecurrenceUnit>,
    /// Step size for --every
    #[arg(long, requires = "every")]
    pub interval: Option<i64>,
    /// Repeat weekly on these days (e.g. mon,thu)
    #[arg(long, value_delimiter = ',', conflicts_with = "repeat")]
    pub on: Vec<DayOfWeek>,
    /// Simple daily, weekly or monthly repetition
    #[arg(long)]
    pub repeat: Option<LegacyPattern>,
    /// Count the next date from completion instead of the due date
    #[arg(long)]
    pub from_completion: bool,
    /// Stop repeating on this date
    #[arg(long)]
    pub until: Option<String>,
    /// Stop after this many occurrences
    #[arg(long)]
    pub count: Option<i64>,
    /// Carry attachments over to each new occurrence
    #[arg(long)]
    pub copy_attachments: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The title of the task
    pub title: String,
    /// The description of the task
    #[arg(short, long)]
    pub description: Option<String>,
    /// The due date of the task
    #[arg(long)]
    pub due: Option<String>,
    /// The priority of the task (high, medium, low)
    #[arg(short, long)]
    pub priority: Option<TaskPriority>,
    /// Category name
    #[arg(short, long)]
    pub category: Option<String>,
    /// People to assign, by name
    #[arg(short, long, value_delimiter = ',')]
    pub assign: Vec<String>,
    #[command(flatten)]
    pub recurrence: RecurrenceArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The ID of the task to edit
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, conflicts_with = "description")]
    pub description_clear: bool,

    #[arg(long)]
    pub due: Option<String>,
    #[arg(long, conflicts_with = "due")]
    pub due_clear: bool,

    #[arg(long)]
    pub priority: Option<TaskPriority>,

    #[arg(long)]
    pub category: Option<String>,
    #[arg(long, conflicts_with = "category")]
    pub category_clear: bool,

    /// Replace the assignees, by name
    #[arg(long, value_delimiter = ',')]
    pub assign: Vec<String>,
    #[arg(long, conflicts_with = "assign")]
    pub assign_clear: bool,

    #[command(flatten)]
    pub recurrence: RecurrenceArgs,
    /// Stop the task from repeating
    #[arg(long, conflicts_with_all = ["every", "on", "repeat"])]
    pub recurrence_clear: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Filter terms: open, done, overdue, today, deleted, priority:<p>, person:<name>, category:<name>
    pub terms: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ShowCommand {
    /// The ID of the task
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct DoneCommand {
    /// The ID of the task to mark as completed
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct UndoCommand {
    /// The ID of the task to reopen
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// The ID of the task to delete
    pub id: String,
    /// Force deletion without confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct PersonCommand {
    #[command(subcommand)]
    pub command: PersonSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PersonSubcommand {
    /// Add a household member
    Add(AddPersonCommand),
    /// List household members
    List,
    /// Remove a household member
    Delete(NameArg),
}

#[derive(Parser, Debug, Clone)]
pub struct AddPersonCommand {
    pub name: String,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CategoryCommand {
    #[command(subcommand)]
    pub command: CategorySubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategorySubcommand {
    /// Add a category
    Add(AddCategoryCommand),
    /// List categories
    List,
    /// Remove a category
    Delete(NameArg),
}

#[derive(Parser, Debug, Clone)]
pub struct AddCategoryCommand {
    pub name: String,
    #[arg(long, default_value = "📌")]
    pub icon: String,
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct NameArg {
    pub name: String,
}

#[derive(Parser, Debug, Clone)]
pub struct AttachCommand {
    /// The ID of the task
    pub id: String,
    /// Stored file reference
    pub filename: String,
    /// Name the file was uploaded with
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub mime: Option<String>,
    /// Size in bytes
    #[arg(long)]
    pub size: Option<i64>,
    /// Person who uploaded it
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CommentCommand {
    #[command(subcommand)]
    pub command: CommentSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CommentSubcommand {
    /// Comment on a task
    Add(AddCommentCommand),
    /// List a task's comments
    List(ShowCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommentCommand {
    /// The ID of the task
    pub id: String,
    pub body: String,
    /// Author, by name
    #[arg(long)]
    pub by: Option<String>,
}
