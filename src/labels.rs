//! Every user-facing literal of the generated site, in Chinese and English.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Zh,
    En,
}

impl Language {
    /// `en*` (case-insensitive) selects English; anything else selects Chinese.
    pub fn from_setting(setting: &str) -> Self {
        if setting.trim().to_ascii_lowercase().starts_with("en") {
            Self::En
        } else {
            Self::Zh
        }
    }

    pub fn html_lang(self) -> &'static str {
        match self {
            Self::Zh => "zh-CN",
            Self::En => "en",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Zh => "zh",
            Self::En => "en",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    SiteTitle,
    LanguageToggle,
    CurrentBatch,
    Archive,
    ArchiveListing,
    Batch,
    BrowseArchive,
    BackToIndex,
    BackToArchive,
    TotalPapers,
    TotalBatches,
    LastUpdated,
    SiteUrl,
    NotConfigured,
    NoPapers,
    NoBatches,
    PaperCount,
    Generated,
    Topics,
    Topic,
    Score,
    ScoreBreakdown,
    Weight,
    Published,
    Updated,
    Authors,
    Categories,
    Venue,
    Links,
    BriefSummary,
    CoreSummary,
    Problem,
    Solution,
    Methodology,
    Experiments,
    Conclusion,
    Tasks,
    Findings,
    Confidence,
    Overview,
    Abstract,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bilingual {
    pub zh: &'static str,
    pub en: &'static str,
}

impl Label {
    pub fn text(self) -> Bilingual {
        let (zh, en) = match self {
            Self::SiteTitle => ("LLM4Reading 摘要汇总", "LLM4Reading Paper Digest"),
            Self::LanguageToggle => ("English", "中文"),
            Self::CurrentBatch => ("本期论文", "This Week's Papers"),
            Self::Archive => ("历史归档", "Archive"),
            Self::ArchiveListing => ("全部批次", "All Batches"),
            Self::Batch => ("批次", "Batch"),
            Self::BrowseArchive => ("查看历史归档", "Browse the archive"),
            Self::BackToIndex => ("返回首页", "Back to index"),
            Self::BackToArchive => ("返回归档列表", "Back to archive"),
            Self::TotalPapers => ("论文总数", "Total papers"),
            Self::TotalBatches => ("批次总数", "Total batches"),
            Self::LastUpdated => ("最后更新", "Last updated"),
            Self::SiteUrl => ("站点地址", "Site URL"),
            Self::NotConfigured => ("尚未配置", "not configured"),
            Self::NoPapers => (
                "本次运行未筛选出符合条件的论文。",
                "No papers were selected in this run.",
            ),
            Self::NoBatches => ("暂无归档批次。", "No batches archived yet."),
            Self::PaperCount => ("论文数", "Papers"),
            Self::Generated => ("生成时间", "Generated"),
            Self::Topics => ("涉及主题", "Topics"),
            Self::Topic => ("主题", "Topic"),
            Self::Score => ("相关性", "Relevance"),
            Self::ScoreBreakdown => ("相关性评分", "Relevance Scores"),
            Self::Weight => ("权重", "weight"),
            Self::Published => ("发表", "Published"),
            Self::Updated => ("更新", "Updated"),
            Self::Authors => ("作者", "Authors"),
            Self::Categories => ("分类", "Categories"),
            Self::Venue => ("发表场所", "Venue"),
            Self::Links => ("链接", "Links"),
            Self::BriefSummary => ("速览", "At a Glance"),
            Self::CoreSummary => ("论文核心内容", "Core Content"),
            Self::Problem => ("主要解决了什么问题？", "What problem does it address?"),
            Self::Solution => ("提出了什么解决方案？", "What solution does it propose?"),
            Self::Methodology => ("核心方法/步骤/策略", "Core method, steps and strategy"),
            Self::Experiments => ("实验设计", "Experimental design"),
            Self::Conclusion => ("结论", "Conclusion"),
            Self::Tasks => ("用户关心的问题", "Questions of Interest"),
            Self::Findings => ("逐项解答", "Answers"),
            Self::Confidence => ("置信度", "Confidence"),
            Self::Overview => ("综合总结", "Overview"),
            Self::Abstract => ("摘要", "Abstract"),
            Self::Empty => ("（暂无）", "(none)"),
        };
        Bilingual { zh, en }
    }

    pub fn in_language(self, language: Language) -> &'static str {
        let text = self.text();
        match language {
            Language::Zh => text.zh,
            Language::En => text.en,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_setting_uses_case_insensitive_en_prefix() {
        assert_eq!(Language::from_setting("en"), Language::En);
        assert_eq!(Language::from_setting("EN-us"), Language::En);
        assert_eq!(Language::from_setting("zh-CN"), Language::Zh);
        assert_eq!(Language::from_setting(""), Language::Zh);
        assert_eq!(Language::from_setting("fr"), Language::Zh);
    }

    #[test]
    fn labels_resolve_per_language() {
        assert_eq!(Label::Conclusion.in_language(Language::Zh), "结论");
        assert_eq!(Label::Conclusion.in_language(Language::En), "Conclusion");
    }
}
