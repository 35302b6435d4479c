//! Purpose: Hold top-level CLI command dispatch for `dogear`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Orchestration only; the session/transport contract lives in `api`.
//! Invariants: Output envelopes and exit code semantics stay unchanged.

use super::*;

use dogear::api::{Comment, NewAccount, NewPost, Post, SearchHit, UserProfile, UserRef, validation};
use dogear::render;
use serde::Serialize;
use time::OffsetDateTime;

pub(super) fn dispatch_command(command: Command, client: &Client) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "dogear", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            if io::stdout().is_terminal() {
                println!("dogear {}", env!("CARGO_PKG_VERSION"));
            } else {
                emit_json(json!({
                    "name": "dogear",
                    "version": env!("CARGO_PKG_VERSION"),
                }));
            }
            Ok(RunOutcome::ok())
        }
        Command::Login { email, password } => {
            client.login(&email, &password)?;
            match client.session().user_id() {
                Some(user_id) => println!("Logged in (user id {user_id})."),
                None => println!("Logged in."),
            }
            Ok(RunOutcome::ok())
        }
        Command::Logout => {
            client.logout()?;
            println!("Logged out.");
            Ok(RunOutcome::ok())
        }
        Command::Signup {
            username,
            email,
            password,
            bio,
            json,
        } => {
            validation::validate_username(&username)?;
            validation::validate_email(&email)?;
            validation::validate_password(&password)?;
            let account = NewAccount {
                username,
                email,
                password: password.clone(),
                password_test: password,
                bio,
            };
            let profile = client.signup(&account)?;
            if json {
                emit_json(to_json(&profile)?);
            } else {
                println!("Account created: {} (id {}).", profile.username, profile.id);
                println!("Log in with: dogear login {} <password>", profile.email);
            }
            Ok(RunOutcome::ok())
        }
        Command::Withdraw { password } => {
            client.withdraw(&password)?;
            println!("Account deleted. Session cleared.");
            Ok(RunOutcome::ok())
        }
        Command::Whoami { json } => {
            let user_id = logged_in_user_id(client)?;
            let profile = client.user(user_id)?;
            if json {
                emit_json(to_json(&profile)?);
            } else {
                emit_profile_human(&profile);
            }
            Ok(RunOutcome::ok())
        }
        Command::Profile { command } => match command {
            ProfileCommand::Edit { username, bio, json } => {
                if username.is_none() && bio.is_none() {
                    return Err(Error::new(ErrorKind::Usage)
                        .with_message("nothing to edit")
                        .with_hint("Pass --username and/or --bio."));
                }
                if let Some(username) = &username {
                    validation::validate_username(username)?;
                }
                let profile = client.update_profile(username.as_deref(), bio.as_deref())?;
                if json {
                    emit_json(to_json(&profile)?);
                } else {
                    println!("Profile updated.");
                    emit_profile_human(&profile);
                }
                Ok(RunOutcome::ok())
            }
        },
        Command::Password { current, new } => {
            validation::validate_password(&new)?;
            client.update_password(&current, &new, &new)?;
            println!("Password updated.");
            Ok(RunOutcome::ok())
        }
        Command::FollowStatus { user_id, json } => {
            let status = client.follow_status(user_id)?;
            if json {
                emit_json(to_json(&status)?);
            } else if status.is_following {
                println!("You follow user {user_id}.");
            } else {
                println!("You do not follow user {user_id}.");
            }
            Ok(RunOutcome::ok())
        }
        Command::Feed {
            personal,
            page,
            limit,
            json,
        } => {
            let posts = if personal {
                client.recommended_posts(page, limit)?
            } else {
                client.popular_posts(page, limit)?
            };
            emit_post_listing(client, &posts, json)?;
            Ok(RunOutcome::ok())
        }
        Command::Post { command } => dispatch_post(command, client),
        Command::Comments { command } => dispatch_comments(command, client),
        Command::Like { post_id } => {
            let toggle = client.toggle_like(post_id)?;
            if toggle.liked {
                println!("Liked post {post_id} ({} likes).", toggle.like_count);
            } else {
                println!("Unliked post {post_id} ({} likes).", toggle.like_count);
            }
            Ok(RunOutcome::ok())
        }
        Command::Likes { post_id, json } => {
            let likes = client.post_likes(post_id)?;
            if json {
                emit_json(to_json(&likes)?);
            } else {
                println!("{} likes", render::group_digits(likes.like_count));
                emit_user_listing(&likes.users);
            }
            Ok(RunOutcome::ok())
        }
        Command::MyLikes { page, limit, json } => {
            let posts = client.liked_posts(page, limit)?;
            emit_post_listing(client, &posts, json)?;
            Ok(RunOutcome::ok())
        }
        Command::Follow { user_id } => {
            client.follow(user_id)?;
            println!("Following user {user_id}.");
            Ok(RunOutcome::ok())
        }
        Command::Unfollow { user_id } => {
            client.unfollow(user_id)?;
            println!("Unfollowed user {user_id}.");
            Ok(RunOutcome::ok())
        }
        Command::Followers { user_id, json } => {
            let users = client.followers(user_id)?;
            if json {
                emit_json(to_json(&users)?);
            } else {
                emit_user_listing(&users);
            }
            Ok(RunOutcome::ok())
        }
        Command::Following { user_id, json } => {
            let users = client.following(user_id)?;
            if json {
                emit_json(to_json(&users)?);
            } else {
                emit_user_listing(&users);
            }
            Ok(RunOutcome::ok())
        }
        Command::Search {
            query,
            tags,
            page,
            json,
        } => {
            let hits = client.search(&query, &tags, page)?;
            if json {
                emit_json(to_json(&hits)?);
            } else {
                emit_search_listing(&hits);
            }
            Ok(RunOutcome::ok())
        }
    }
}

fn dispatch_post(command: PostCommand, client: &Client) -> Result<RunOutcome, Error> {
    match command {
        PostCommand::Show { id, json } => {
            let post = client.post(id)?;
            let comments = client.comments(id)?;
            if json {
                emit_json(json!({
                    "post": to_json(&post)?,
                    "comments": to_json(&comments)?,
                }));
            } else {
                let authors = client.resolve_authors(&collect_author_ids(&post, &comments));
                let mine = client.session().is_owner(post.user_id);
                emit_post_human(&post, &authors, mine);
                emit_comments_human(&comments, &authors);
            }
            Ok(RunOutcome::ok())
        }
        PostCommand::Create {
            title,
            content,
            isbn,
            book_title,
            book_author,
            json,
        } => {
            validation::validate_isbn(&isbn)?;
            let post = client.create_post(&NewPost {
                title,
                content,
                isbn,
                book_title,
                book_author,
            })?;
            if json {
                emit_json(to_json(&post)?);
            } else {
                println!("Created post {}: {}", post.id, post.title);
            }
            Ok(RunOutcome::ok())
        }
        PostCommand::Edit { id, title, content } => {
            if title.is_none() && content.is_none() {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("nothing to edit")
                    .with_hint("Pass --title and/or --content."));
            }
            let post = client.update_post(id, title.as_deref(), content.as_deref())?;
            println!("Updated post {}: {}", post.id, post.title);
            Ok(RunOutcome::ok())
        }
        PostCommand::Delete { id } => {
            client.delete_post(id)?;
            println!("Deleted post {id}.");
            Ok(RunOutcome::ok())
        }
        PostCommand::OfUser { user_id, json } => {
            let posts = client.user_posts(user_id)?;
            emit_post_listing(client, &posts, json)?;
            Ok(RunOutcome::ok())
        }
        PostCommand::Related { id, limit, json } => {
            let posts = client.related_posts(id, limit)?;
            emit_post_listing(client, &posts, json)?;
            Ok(RunOutcome::ok())
        }
    }
}

fn dispatch_comments(command: CommentsCommand, client: &Client) -> Result<RunOutcome, Error> {
    match command {
        CommentsCommand::List { post_id, json } => {
            let comments = client.comments(post_id)?;
            if json {
                emit_json(to_json(&comments)?);
            } else {
                let user_ids: Vec<u64> = comments.iter().map(|comment| comment.user_id).collect();
                let authors = client.resolve_authors(&user_ids);
                emit_comments_human(&comments, &authors);
            }
            Ok(RunOutcome::ok())
        }
        CommentsCommand::Add {
            post_id,
            content,
            reply_to,
        } => {
            let comment = client.create_comment(post_id, &content, reply_to)?;
            match reply_to {
                Some(parent) => println!("Replied to comment {parent} (comment {}).", comment.id),
                None => println!("Commented on post {post_id} (comment {}).", comment.id),
            }
            Ok(RunOutcome::ok())
        }
        CommentsCommand::Edit {
            comment_id,
            content,
        } => {
            client.update_comment(comment_id, &content)?;
            println!("Updated comment {comment_id}.");
            Ok(RunOutcome::ok())
        }
        CommentsCommand::Delete { comment_id } => {
            client.delete_comment(comment_id)?;
            println!("Deleted comment {comment_id}.");
            Ok(RunOutcome::ok())
        }
    }
}

fn logged_in_user_id(client: &Client) -> Result<u64, Error> {
    let Some(raw) = client.session().user_id() else {
        return Err(Error::new(ErrorKind::Unauthorized).with_message("not logged in"));
    };
    raw.parse().map_err(|_| {
        Error::new(ErrorKind::Internal).with_message("stored user id is not numeric")
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode output json")
            .with_source(err)
    })
}

fn collect_author_ids(post: &Post, comments: &[Comment]) -> Vec<u64> {
    let mut ids = vec![post.user_id];
    ids.extend(comments.iter().map(|comment| comment.user_id));
    ids
}

fn emit_post_listing(client: &Client, posts: &[Post], json: bool) -> Result<(), Error> {
    if json {
        emit_json(to_json(&posts)?);
        return Ok(());
    }
    if posts.is_empty() {
        println!("No posts.");
        return Ok(());
    }
    let user_ids: Vec<u64> = posts.iter().map(|post| post.user_id).collect();
    let authors = client.resolve_authors(&user_ids);
    let now = OffsetDateTime::now_utc();
    for post in posts {
        let author = author_label(&authors, post.user_id);
        println!(
            "#{:<6} {:<42} by {:<16} {:>6} views  {:>4} likes  {}",
            post.id,
            render::truncate(&post.title, 40),
            author,
            render::compact_count(post.views),
            render::compact_count(post.like_count),
            render::relative_time(&post.created_at, now),
        );
    }
    Ok(())
}

fn emit_post_human(post: &Post, authors: &std::collections::HashMap<u64, String>, mine: bool) {
    let now = OffsetDateTime::now_utc();
    println!("#{} {}", post.id, post.title);
    let author = author_label(authors, post.user_id);
    let author = if mine { format!("{author} (you)") } else { author };
    println!(
        "by {}  {}  {} views  {} likes",
        author,
        render::relative_time(&post.created_at, now),
        render::group_digits(post.views),
        render::group_digits(post.like_count),
    );
    if !post.tags.is_empty() {
        let names: Vec<&str> = post.tags.iter().map(|tag| tag.name.as_str()).collect();
        println!("tags: {}", names.join(", "));
    }
    println!("isbn: {}", post.isbn);
    println!();
    println!("{}", post.content);
}

fn emit_comments_human(comments: &[Comment], authors: &std::collections::HashMap<u64, String>) {
    if comments.is_empty() {
        println!();
        println!("No comments.");
        return;
    }
    let now = OffsetDateTime::now_utc();
    println!();
    println!("{} comments", comments.len());
    for comment in comments {
        let indent = if comment.depth > 0 { "    " } else { "  " };
        println!(
            "{indent}[{}] {} ({}): {}",
            comment.id,
            author_label(authors, comment.user_id),
            render::relative_time(&comment.created_at, now),
            comment.content,
        );
    }
}

fn emit_profile_human(profile: &UserProfile) {
    println!("{} (id {})", profile.username, profile.id);
    println!("email: {}", profile.email);
    if !profile.bio.is_empty() {
        println!("bio: {}", profile.bio);
    }
    println!("total views: {}", render::group_digits(profile.total_views));
    println!("joined: {}", render::format_date(&profile.created_at));
}

fn emit_user_listing(users: &[UserRef]) {
    if users.is_empty() {
        println!("Nobody here yet.");
        return;
    }
    for user in users {
        println!("#{:<6} {}", user.id, user.username);
    }
}

fn emit_search_listing(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("No matches.");
        return;
    }
    let now = OffsetDateTime::now_utc();
    for hit in hits {
        let tags = if hit.tags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", hit.tags.join(", "))
        };
        println!(
            "#{:<6} {:<42} {:<28} {}{tags}",
            hit.post_id,
            render::truncate(&hit.title, 40),
            render::truncate(&hit.book_title, 26),
            render::relative_time(&hit.created_at, now),
        );
    }
}

fn author_label(authors: &std::collections::HashMap<u64, String>, user_id: u64) -> String {
    authors
        .get(&user_id)
        .cloned()
        .unwrap_or_else(|| dogear::api::FALLBACK_AUTHOR.to_string())
}
