//! Entity records scraped from the forum
//!
//! Every record is keyed by the site-assigned integer id except guests
//! (negative synthetic ids, see [`crate::storage::ForumStore::resolve_guest`])
//! and images (store-assigned rowid, content-addressed by MD5 hash).
//!
//! Non-user entities are carried through the content queue as [`Content`]
//! variants; the persistence consumer matches on the variant to pick the
//! upsert to apply.

/// A registered forum user, or a guest when `id` is negative.
///
/// Timestamps (`date_registered`, `last_online`, post/edit dates) are kept as
/// the Unix-timestamp strings the site embeds in its markup; the archive
/// preserves them verbatim rather than reinterpreting them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: Option<String>,
    pub username: Option<String>,
    pub group: Option<String>,
    pub date_registered: Option<String>,
    pub last_online: Option<String>,
    pub age: Option<i64>,
    pub birthdate: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub location: Option<String>,
    pub latest_status: Option<String>,
    pub instant_messengers: Option<String>,
    pub signature: Option<String>,
    pub post_count: Option<i64>,
    pub website: Option<String>,
    pub website_url: Option<String>,
    pub url: Option<String>,
}

impl User {
    /// A guest user record: name only, id assigned by the guest resolver.
    pub fn guest(id: i64, name: &str) -> Self {
        Self {
            id,
            name: Some(name.to_string()),
            ..Self::default()
        }
    }
}

/// A top-level category grouping boards on the homepage.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A board (or sub-board, when `parent_id` is set).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub password_protected: bool,
    pub url: Option<String>,
}

/// A board/user moderation link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Moderator {
    pub board_id: i64,
    pub user_id: i64,
}

/// A thread; `user_id` is the creating user (negative for guests).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Thread {
    pub id: i64,
    pub title: String,
    pub board_id: i64,
    pub user_id: i64,
    pub locked: bool,
    pub sticky: bool,
    pub announcement: bool,
    pub views: Option<i64>,
    pub url: Option<String>,
}

/// A post within a thread. The message body is the raw markup as found on
/// the page; `last_edited`/`edit_user_id` are set only when the page shows
/// an edit record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Post {
    pub id: i64,
    pub thread_id: i64,
    pub user_id: i64,
    pub date: Option<String>,
    pub message: String,
    pub last_edited: Option<String>,
    pub edit_user_id: Option<i64>,
    pub url: Option<String>,
}

/// A poll attached to a thread; shares the thread's id (1:1).
#[derive(Debug, Clone, PartialEq)]
pub struct Poll {
    pub id: i64,
    pub question: String,
}

/// One option of a poll. The vote count is the page's tally; which voter
/// chose which option is not recorded anywhere on the site.
#[derive(Debug, Clone, PartialEq)]
pub struct PollOption {
    pub id: i64,
    pub poll_id: i64,
    pub name: String,
    pub votes: i64,
}

/// Records that a user voted in a poll (not what they voted for).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollVoter {
    pub poll_id: i64,
    pub user_id: i64,
}

/// Content-addressed image metadata.
///
/// `id` is assigned by the store on first insertion. `filename`, `md5_hash`
/// and `size` stay `None` when the download failed; the metadata row is
/// still recorded so avatar links remain valid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image {
    pub id: Option<i64>,
    pub url: String,
    pub filename: Option<String>,
    pub md5_hash: Option<String>,
    pub size: Option<i64>,
}

/// Links a user to their avatar image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avatar {
    pub user_id: i64,
    pub image_id: i64,
}

/// A shoutbox message. Flat; no parent entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ShoutboxPost {
    pub id: i64,
    pub user_id: i64,
    pub date: Option<String>,
    pub message: String,
}

/// Discriminated union of everything the content queue carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Category(Category),
    Board(Board),
    Moderator(Moderator),
    Thread(Thread),
    Post(Post),
    Poll(Poll),
    PollOption(PollOption),
    PollVoter(PollVoter),
    Image(Image),
    ShoutboxPost(ShoutboxPost),
}

impl Content {
    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Content::Category(_) => "category",
            Content::Board(_) => "board",
            Content::Moderator(_) => "moderator",
            Content::Thread(_) => "thread",
            Content::Post(_) => "post",
            Content::Poll(_) => "poll",
            Content::PollOption(_) => "poll_option",
            Content::PollVoter(_) => "poll_voter",
            Content::Image(_) => "image",
            Content::ShoutboxPost(_) => "shoutbox_post",
        }
    }
}
