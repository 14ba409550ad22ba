use chrono::{Duration, Utc};
use rand::{seq::SliceRandom, Rng};
use threadsync_client::api::{
    AuthToken, Author, Comment, CommentId, ContentRef, Deletion, QuoteSnapshot, Time, UserId,
    Uuid,
};
use threadsync_mock_server::{Seed, SeedThread, SeedUser};

const NUM_USERS: usize = 5;

const NUM_THREADS: usize = 4;
const NUM_ARTICLES: usize = 2;

const NUM_TOP_LEVEL: usize = 60;
const MAX_REPLIES: usize = 4;
const MAX_DEPTH: usize = 3;
const COMMENT_WORD_COUNT: usize = 25;

const COLORS: [&str; 6] = [
    "#e6194b", "#3cb44b", "#4363d8", "#f58231", "#911eb4", "#008080",
];

struct Gen<'a> {
    rng: rand::rngs::ThreadRng,
    users: &'a [Author],
    now: Time,

    /// Every comment generated so far in the current thread, as quotable
    quotable: Vec<QuoteSnapshot>,
}

impl<'a> Gen<'a> {
    fn user(&mut self) -> Author {
        self.users
            .choose(&mut self.rng)
            .expect("generating comments without users")
            .clone()
    }

    fn chance(&mut self, percent: u32) -> bool {
        self.rng.gen_ratio(percent, 100)
    }

    fn comment(&mut self, depth: usize) -> Comment {
        self.now = self.now + Duration::seconds(self.rng.gen_range(1..3600));
        let author = self.user();
        let text = lipsum::lipsum_words(self.rng.gen_range(1..COMMENT_WORD_COUNT));
        let edited_at = self
            .chance(15)
            .then(|| self.now + Duration::minutes(self.rng.gen_range(1..60)));
        let deleted = self.chance(10).then(|| Deletion {
            at: self.now + Duration::minutes(self.rng.gen_range(1..60)),
            by: author.id,
        });
        let replied_to = match depth > 0 && self.chance(40) {
            true => self.quotable.choose(&mut self.rng).cloned(),
            false => None,
        };
        let mut c = Comment {
            id: CommentId(Uuid::new_v4()),
            author,
            text,
            created_at: self.now,
            edited_at,
            deleted,
            replied_to,
            is_solution: false,
            vote_total: self.rng.gen_range(-3..20),
            replies: Vec::new(),
        };
        self.quotable.push(QuoteSnapshot {
            id: c.id,
            author: c.author.display_name.clone(),
            text: c.text.clone(),
            color: c.author.color.clone(),
            is_edited: c.edited_at.is_some(),
            is_deleted: c.deleted.is_some(),
        });
        if depth < MAX_DEPTH {
            for _ in 0..self.rng.gen_range(0..=MAX_REPLIES / (depth + 1)) {
                let reply = self.comment(depth + 1);
                c.replies.push(reply);
            }
        }
        c
    }

    fn thread(&mut self, content: ContentRef, owner: UserId) -> SeedThread {
        self.quotable.clear();
        let mut comments = (0..NUM_TOP_LEVEL)
            .map(|_| self.comment(0))
            .collect::<Vec<_>>();

        // quotes were captured before the quoted comment got deleted
        let deleted = comments
            .iter()
            .flat_map(all_nodes)
            .filter(|c| c.deleted.is_some())
            .map(|c| c.id)
            .collect::<Vec<_>>();
        for c in comments.iter_mut() {
            c.for_each_mut(&mut |c| {
                if let Some(q) = c.replied_to.as_mut() {
                    q.is_deleted = deleted.contains(&q.id);
                }
            });
        }

        if content.content_type.supports_solution() {
            let replies = comments
                .iter()
                .flat_map(|c| c.replies.iter())
                .filter(|r| r.deleted.is_none())
                .map(|r| r.id)
                .collect::<Vec<_>>();
            if let Some(id) = replies.choose(&mut self.rng).copied() {
                for c in comments.iter_mut() {
                    if let Some(r) = c.find_mut(id) {
                        r.is_solution = true;
                    }
                }
            }
        }

        SeedThread {
            content,
            owner: Some(owner),
            comments,
        }
    }
}

fn all_nodes(c: &Comment) -> Vec<&Comment> {
    let mut res = vec![c];
    for r in c.replies.iter() {
        res.extend(all_nodes(r));
    }
    res
}

fn main() {
    let mut rng = rand::thread_rng();

    // Generate users
    let users = (0..NUM_USERS)
        .map(|i| SeedUser {
            author: Author {
                id: UserId(Uuid::new_v4()),
                display_name: format!("user{i}"),
                avatar_url: None,
                color: String::from(COLORS[i % COLORS.len()]),
            },
            token: AuthToken(Uuid::new_v4()),
        })
        .collect::<Vec<_>>();
    let authors = users.iter().map(|u| u.author.clone()).collect::<Vec<_>>();
    for u in users.iter() {
        eprintln!("{}: token {}", u.author.display_name, u.token.0);
    }

    // Generate threads and articles
    let mut gen = Gen {
        rng: rand::thread_rng(),
        users: &authors,
        now: Utc::now() - Duration::days(365),
        quotable: Vec::new(),
    };
    let mut threads = Vec::new();
    for i in 0..NUM_THREADS + NUM_ARTICLES {
        let content = match i < NUM_THREADS {
            true => ContentRef::thread(Uuid::new_v4()),
            false => ContentRef::article(Uuid::new_v4()),
        };
        let owner = authors[rng.gen_range(0..authors.len())].id;
        let thread = gen.thread(content, owner);
        eprintln!("{content}: {} top-level comments", thread.comments.len());
        threads.push(thread);
    }

    let seed = Seed { users, threads };
    println!(
        "{}",
        serde_json::to_string_pretty(&seed).expect("serializing seed data")
    );
}
