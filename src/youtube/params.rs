use serde::Deserialize;

/// Typed search filters forwarded to the upstream `search` endpoint.
///
/// Filters carrying an `any` sentinel are forwarded only when set to a real
/// value; `any` means unset to YouTube, so it is skipped entirely.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchParams {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<SearchType>,
    pub order: Option<SearchOrder>,
    pub published_after: Option<String>,
    pub published_before: Option<String>,
    pub video_duration: Option<VideoDuration>,
    pub video_definition: Option<VideoDefinition>,
    pub video_dimension: Option<VideoDimension>,
    pub video_embeddable: Option<VideoEmbeddable>,
    pub video_license: Option<VideoLicense>,
    pub video_syndicated: Option<VideoSyndicated>,
    pub video_type: Option<VideoType>,
    pub video_category_id: Option<String>,
    pub region_code: Option<String>,
    pub relevance_language: Option<String>,
    pub safe_search: Option<SafeSearch>,
    pub max_results: Option<u32>,
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Video,
    Channel,
    Playlist,
}

impl SearchType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Channel => "channel",
            Self::Playlist => "playlist",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchOrder {
    Date,
    Rating,
    Relevance,
    Title,
    VideoCount,
    ViewCount,
}

impl SearchOrder {
    fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Rating => "rating",
            Self::Relevance => "relevance",
            Self::Title => "title",
            Self::VideoCount => "videoCount",
            Self::ViewCount => "viewCount",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoDuration {
    Short,
    Medium,
    Long,
    Any,
}

impl VideoDuration {
    fn as_query(self) -> Option<&'static str> {
        match self {
            Self::Short => Some("short"),
            Self::Medium => Some("medium"),
            Self::Long => Some("long"),
            Self::Any => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoDefinition {
    High,
    Standard,
    Any,
}

impl VideoDefinition {
    fn as_query(self) -> Option<&'static str> {
        match self {
            Self::High => Some("high"),
            Self::Standard => Some("standard"),
            Self::Any => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum VideoDimension {
    #[serde(rename = "2d")]
    TwoD,
    #[serde(rename = "3d")]
    ThreeD,
    #[serde(rename = "any")]
    Any,
}

impl VideoDimension {
    fn as_query(self) -> Option<&'static str> {
        match self {
            Self::TwoD => Some("2d"),
            Self::ThreeD => Some("3d"),
            Self::Any => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoEmbeddable {
    True,
    Any,
}

impl VideoEmbeddable {
    fn as_query(self) -> Option<&'static str> {
        match self {
            Self::True => Some("true"),
            Self::Any => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VideoLicense {
    CreativeCommon,
    Youtube,
    Any,
}

impl VideoLicense {
    fn as_query(self) -> Option<&'static str> {
        match self {
            Self::CreativeCommon => Some("creativeCommon"),
            Self::Youtube => Some("youtube"),
            Self::Any => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSyndicated {
    True,
    Any,
}

impl VideoSyndicated {
    fn as_query(self) -> Option<&'static str> {
        match self {
            Self::True => Some("true"),
            Self::Any => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    Episode,
    Movie,
    Any,
}

impl VideoType {
    fn as_query(self) -> Option<&'static str> {
        match self {
            Self::Episode => Some("episode"),
            Self::Movie => Some("movie"),
            Self::Any => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    Moderate,
    None,
    Strict,
}

impl SafeSearch {
    fn as_str(self) -> &'static str {
        match self {
            Self::Moderate => "moderate",
            Self::None => "none",
            Self::Strict => "strict",
        }
    }
}

impl SearchParams {
    /// Builds the upstream query: part/maxResults defaults plus every set
    /// filter, with `any` sentinels dropped.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("part", "snippet".to_string()),
            ("maxResults", self.max_results.unwrap_or(50).to_string()),
        ];

        if let Some(v) = &self.q {
            query.push(("q", v.clone()));
        }
        if let Some(v) = self.kind {
            query.push(("type", v.as_str().to_string()));
        }
        if let Some(v) = self.order {
            query.push(("order", v.as_str().to_string()));
        }
        if let Some(v) = &self.published_after {
            query.push(("publishedAfter", v.clone()));
        }
        if let Some(v) = &self.published_before {
            query.push(("publishedBefore", v.clone()));
        }
        if let Some(v) = self.video_duration.and_then(VideoDuration::as_query) {
            query.push(("videoDuration", v.to_string()));
        }
        if let Some(v) = self.video_definition.and_then(VideoDefinition::as_query) {
            query.push(("videoDefinition", v.to_string()));
        }
        if let Some(v) = self.video_dimension.and_then(VideoDimension::as_query) {
            query.push(("videoDimension", v.to_string()));
        }
        if let Some(v) = self.video_embeddable.and_then(VideoEmbeddable::as_query) {
            query.push(("videoEmbeddable", v.to_string()));
        }
        if let Some(v) = self.video_license.and_then(VideoLicense::as_query) {
            query.push(("videoLicense", v.to_string()));
        }
        if let Some(v) = self.video_syndicated.and_then(VideoSyndicated::as_query) {
            query.push(("videoSyndicated", v.to_string()));
        }
        if let Some(v) = self.video_type.and_then(VideoType::as_query) {
            query.push(("videoType", v.to_string()));
        }
        if let Some(v) = &self.video_category_id {
            query.push(("videoCategoryId", v.clone()));
        }
        if let Some(v) = &self.region_code {
            query.push(("regionCode", v.clone()));
        }
        if let Some(v) = &self.relevance_language {
            query.push(("relevanceLanguage", v.clone()));
        }
        if let Some(v) = self.safe_search {
            query.push(("safeSearch", v.as_str().to_string()));
        }
        if let Some(v) = &self.page_token {
            query.push(("pageToken", v.clone()));
        }

        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of<'a>(query: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn defaults_are_part_and_max_results() {
        let query = SearchParams::default().to_query();
        assert_eq!(query.len(), 2);
        assert_eq!(value_of(&query, "part"), Some("snippet"));
        assert_eq!(value_of(&query, "maxResults"), Some("50"));
    }

    #[test]
    fn any_sentinel_filters_are_dropped() {
        let params = SearchParams {
            video_duration: Some(VideoDuration::Any),
            video_definition: Some(VideoDefinition::Any),
            video_dimension: Some(VideoDimension::Any),
            video_embeddable: Some(VideoEmbeddable::Any),
            video_license: Some(VideoLicense::Any),
            video_syndicated: Some(VideoSyndicated::Any),
            video_type: Some(VideoType::Any),
            ..Default::default()
        };
        let query = params.to_query();
        assert_eq!(query.len(), 2, "only part and maxResults expected");
    }

    #[test]
    fn real_filter_values_pass_through() {
        let params = SearchParams {
            q: Some("rust".into()),
            kind: Some(SearchType::Video),
            order: Some(SearchOrder::ViewCount),
            video_duration: Some(VideoDuration::Short),
            video_dimension: Some(VideoDimension::ThreeD),
            safe_search: Some(SafeSearch::Strict),
            max_results: Some(10),
            page_token: Some("CAUQAA".into()),
            ..Default::default()
        };
        let query = params.to_query();
        assert_eq!(value_of(&query, "q"), Some("rust"));
        assert_eq!(value_of(&query, "type"), Some("video"));
        assert_eq!(value_of(&query, "order"), Some("viewCount"));
        assert_eq!(value_of(&query, "videoDuration"), Some("short"));
        assert_eq!(value_of(&query, "videoDimension"), Some("3d"));
        assert_eq!(value_of(&query, "safeSearch"), Some("strict"));
        assert_eq!(value_of(&query, "maxResults"), Some("10"));
        assert_eq!(value_of(&query, "pageToken"), Some("CAUQAA"));
    }

    #[test]
    fn query_string_deserialization_uses_camel_case() {
        let params: SearchParams = serde_json::from_str(
            r#"{"q":"cats","type":"channel","order":"videoCount","videoLicense":"creativeCommon"}"#,
        )
        .unwrap();
        assert_eq!(params.kind, Some(SearchType::Channel));
        assert_eq!(params.order, Some(SearchOrder::VideoCount));
        assert_eq!(params.video_license, Some(VideoLicense::CreativeCommon));
    }
}
