//! Recent paleontology news, from NewsAPI

use crate::{
    progress::{ProgressConfig, ProgressReport, Work},
    Result,
};
use anyhow::Context;
use chrono::{Days, NaiveDate, Utc};
use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, sync::Arc};
use tokio::task::JoinSet;
use unicase::UniCase;

/// NewsAPI full-text search endpoint
pub const NEWS_ENDPOINT: &str = "https://newsapi.org/v2/everything";

/// Searches that are run to find news articles
pub const TOPICS: [&str; 5] = [
    "dinosaur fossils discovery",
    "cretaceous dinosaurs",
    "dinosaur digging",
    "triassic dinosaurs",
    "Jurassic dinosaur",
];

/// How far back in time articles are searched, in days
///
/// The free NewsAPI plan doesn't go back further than a month.
const LOOKBACK_DAYS: u64 = 29;

/// Maximal number of articles to be displayed
pub const MAX_ARTICLES: usize = 30;

/// News article
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub title: Option<Box<str>>,
    #[serde(default)]
    pub description: Option<Box<str>>,
    #[serde(default)]
    pub url: Option<Box<str>>,
    #[serde(default)]
    pub url_to_image: Option<Box<str>>,
    #[serde(default)]
    pub published_at: Option<Box<str>>,
    #[serde(default)]
    pub source: Option<Source>,
}

/// Publisher of a news article
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Source {
    #[serde(default)]
    pub name: Option<Box<str>>,
}

/// NewsAPI client
#[derive(Clone, Debug)]
pub struct NewsClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Box<str>,
}
//
impl NewsClient {
    /// Set up a NewsAPI client
    pub fn new(client: reqwest::Client, endpoint: &str, api_key: &str) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: Url::parse(endpoint)
                .with_context(|| format!("parsing news endpoint {endpoint:?}"))?,
            api_key: api_key.into(),
        })
    }

    /// Fetch the most popular articles about a topic since a certain date
    pub async fn search(&self, topic: &str, from: NaiveDate) -> Result<Vec<Article>> {
        #[derive(Deserialize)]
        struct Page {
            articles: Vec<Article>,
        }

        let context = || format!("searching news about {topic:?}");
        let from = from.format("%Y-%m-%d").to_string();
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("q", topic),
                ("from", from.as_str()),
                ("sortBy", "popularity"),
                ("language", "en"),
                ("apiKey", &*self.api_key),
            ])
            .send()
            .await
            .and_then(Response::error_for_status)
            .with_context(context)?;
        let page = response.json::<Page>().await.with_context(context)?;
        log::debug!("Found {} articles about {topic:?}", page.articles.len());
        Ok(page.articles)
    }
}

/// Fetch recent articles about every topic and select the best ones
///
/// Topics whose search fails are skipped.
pub async fn latest(client: Arc<NewsClient>, report: &ProgressReport) -> Vec<Article> {
    let from = Utc::now().date_naive() - Days::new(LOOKBACK_DAYS);

    // Search all topics at once
    let searches = report.add(
        "Searching news",
        ProgressConfig::new(Work::Steps(TOPICS.len())),
    );
    let mut requests = JoinSet::new();
    for (idx, topic) in TOPICS.into_iter().enumerate() {
        let client = client.clone();
        requests.spawn(async move { (idx, topic, client.search(topic, from).await) });
    }

    // Keep topic order in the output, whatever order the searches finish in
    let mut per_topic = vec![Vec::new(); TOPICS.len()];
    while let Some(outcome) = requests.join_next().await {
        searches.make_progress(1);
        match outcome {
            Ok((idx, _topic, Ok(articles))) => per_topic[idx] = articles,
            Ok((_idx, topic, Err(e))) => log::warn!("Skipping news about {topic:?}: {e:#}"),
            Err(e) => log::error!("News search task failed: {e}"),
        }
    }
    select(per_topic.into_iter().flatten())
}

/// Pick articles that are about dinosaurs and come with a secure picture,
/// without repeating titles, up to [`MAX_ARTICLES`]
pub fn select(articles: impl IntoIterator<Item = Article>) -> Vec<Article> {
    let mut seen_titles = HashSet::new();
    articles
        .into_iter()
        .filter(|article| {
            let Some(title) = article.title.as_deref().map(str::trim) else {
                return false;
            };
            title.to_lowercase().contains("dinosaur")
                && article
                    .url_to_image
                    .as_deref()
                    .is_some_and(|image| image.starts_with("https://"))
                && seen_titles.insert(UniCase::new(title.to_owned()))
        })
        .take(MAX_ARTICLES)
        .collect()
}
