use anyhow::Context;
use futures::StreamExt;
use threadsync_client::{
    api::{AuthToken, CommentId, ContentRef, FeedMessage, Uuid},
    Comment, CommentTree, HttpStore, NodeId, Order, Store, ThreadConfig, ThreadView,
};

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(short, long, env = "THREADSYNC_HOST")]
    host: String,

    #[structopt(long, env = "THREADSYNC_TOKEN")]
    token: Uuid,

    /// Forum thread to act on
    #[structopt(long, conflicts_with = "article", required_unless = "article")]
    thread: Option<Uuid>,

    /// Article to act on
    #[structopt(long)]
    article: Option<Uuid>,

    #[structopt(long, default_value = "20")]
    page_size: usize,

    /// Act as a forum deployment, where comments cannot be edited
    #[structopt(long)]
    no_edit: bool,

    /// Act as the owner of the thread, who moderates comments and picks the
    /// solution
    #[structopt(long)]
    owner: bool,

    /// One of newest, oldest or replies
    #[structopt(long, default_value = "newest", parse(try_from_str = parse_order))]
    order: Order,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Print the whole comment tree
    Show,

    /// Post a top-level comment
    Post { text: String },

    /// Reply to a comment
    Reply {
        parent: Uuid,
        text: String,

        /// Comment to quote, defaults to none
        #[structopt(long)]
        quote: Option<Uuid>,
    },

    /// Replace the text of one of your comments
    Edit { id: Uuid, text: String },

    /// Delete a comment, keeping its replies
    Delete { id: Uuid },

    /// Mark a reply as the solution of the thread
    Solve { id: Uuid },

    /// Clear the solution mark of a reply
    Unsolve { id: Uuid },

    /// Print pushed changes until interrupted
    Watch,
}

fn parse_order(s: &str) -> anyhow::Result<Order> {
    match s {
        "newest" => Ok(Order::newest_first()),
        "oldest" => Ok(Order::oldest_first()),
        "replies" => Ok(Order::most_replies()),
        _ => Err(anyhow::anyhow!("unknown order {s:?}")),
    }
}

fn node(id: Uuid) -> NodeId {
    NodeId::Stored(CommentId(id))
}

fn print_comment(c: &Comment, depth: usize) {
    let indent = "  ".repeat(depth);
    let mut flags = String::new();
    if c.is_solution {
        flags.push_str(" [solution]");
    }
    if c.is_edited() {
        flags.push_str(" (edited)");
    }
    println!(
        "{indent}{} {} ({:+}){flags}",
        c.id, c.author.display_name, c.vote_total
    );
    if let Some(q) = &c.replied_to {
        match q.is_deleted {
            true => println!("{indent}  > {}: \"{}\" (since deleted)", q.author, q.text),
            false => println!("{indent}  > {}: \"{}\"", q.author, q.text),
        }
    }
    match c.visible_text() {
        Some(text) => println!("{indent}  {text}"),
        None => println!("{indent}  [this comment has been deleted]"),
    }
    for r in c.replies.iter() {
        print_comment(r, depth + 1);
    }
}

fn print_tree(tree: &CommentTree, total: usize) {
    println!("{} top-level comments out of {}", tree.len(), total);
    for c in tree.roots().iter() {
        print_comment(c, 0);
    }
}

async fn load_all(view: &ThreadView<HttpStore>) -> anyhow::Result<()> {
    while view.has_more() {
        view.load_next_page().await.context("loading comments")?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opt = <Opt as structopt::StructOpt>::from_args();

    let content = match (opt.thread, opt.article) {
        (Some(id), _) => ContentRef::thread(id),
        (None, Some(id)) => ContentRef::article(id),
        (None, None) => anyhow::bail!("one of --thread or --article is required"),
    };
    let store = HttpStore::new(opt.host.clone(), AuthToken(opt.token));
    let viewer = store
        .whoami()
        .await
        .with_context(|| format!("authenticating to {}", opt.host))?;
    tracing::debug!(user = %viewer.display_name, %content, "authenticated");
    let mut config = ThreadConfig::new(viewer.clone());
    config.page_size = opt.page_size;
    config.edit_enabled = !opt.no_edit;

    let view = ThreadView::new(store, content, config);
    view.load_first_page(opt.order)
        .await
        .context("loading first page")?;
    load_all(&view).await?;

    let author_of = |id: NodeId| -> anyhow::Result<bool> {
        let tree = view.tree();
        let c = tree
            .find_by_id(id)
            .with_context(|| format!("no comment {id} in {content}"))?;
        Ok(c.author.id == viewer.id)
    };

    match opt.cmd {
        Command::Show => print_tree(&view.tree(), view.total()),
        Command::Post { text } => {
            let id = view.post_comment(text).await.context("posting comment")?;
            println!("{id}");
        }
        Command::Reply {
            parent,
            text,
            quote,
        } => {
            let id = view
                .reply(node(parent), quote.map(node), text)
                .await
                .context("posting reply")?;
            println!("{id}");
        }
        Command::Edit { id, text } => {
            let authorized = author_of(node(id))?;
            view.edit(node(id), text, authorized)
                .await
                .context("editing comment")?;
        }
        Command::Delete { id } => {
            let authorized = opt.owner || author_of(node(id))?;
            view.delete(node(id), authorized)
                .await
                .context("deleting comment")?;
        }
        Command::Solve { id } => view
            .mark_solution(node(id), opt.owner)
            .await
            .context("marking solution")?,
        Command::Unsolve { id } => view
            .unmark_solution(node(id), opt.owner)
            .await
            .context("clearing solution")?,
        Command::Watch => {
            let events = view
                .store()
                .subscribe(&content)
                .await
                .context("subscribing to pushes")?
                .inspect(|evt| match &evt.message {
                    FeedMessage::NewComment(c) => println!("new comment {}", c.id),
                    FeedMessage::NewReply { parent_id, comment } => {
                        println!("new reply {} to {}", comment.id, parent_id)
                    }
                    FeedMessage::VoteChanged {
                        comment_id,
                        vote_total,
                    } => println!("{comment_id} now has {vote_total:+} votes"),
                    FeedMessage::CommentEdited { comment_id, .. } => {
                        println!("{comment_id} was edited")
                    }
                    FeedMessage::CommentDeleted { comment_id, .. } => {
                        println!("{comment_id} was deleted")
                    }
                    FeedMessage::SolutionChanged {
                        comment_id,
                        is_solution,
                    } => println!("{comment_id} solution: {is_solution}"),
                })
                .boxed();
            let feed = view.attach_feed(events);
            tokio::signal::ctrl_c()
                .await
                .context("waiting for interruption")?;
            feed.stop().await;
            print_tree(&view.tree(), view.total());
        }
    }

    view.close();
    Ok(())
}
