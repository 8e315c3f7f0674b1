use ratatui::style::{Color, Modifier, Style};
use saferr_core::models::{PlanLimit, SubscriptionStatus};

// Color palette
pub const SHIELD: Color = Color::Rgb(40, 150, 160);
pub const GENUINE: Color = Color::Rgb(80, 170, 110);
pub const CAUTION: Color = Color::Rgb(214, 168, 52);
pub const COUNTERFEIT: Color = Color::Rgb(208, 72, 72);
pub const MUTED: Color = Color::Rgb(128, 128, 136);
pub const HIGHLIGHT: Color = Color::Rgb(36, 52, 60);

/// A code checked this many times is treated as a likely copy
const COUNTERFEIT_CHECKS: u64 = 4;

/// Plan usage (percent) at which the quota turns amber, then red
const QUOTA_WARN_PERCENT: u64 = 75;
const QUOTA_FULL_PERCENT: u64 = 90;

// Styles
pub fn title_style() -> Style {
    Style::default().fg(SHIELD).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default().bg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(CAUTION)
}

pub fn error_style() -> Style {
    Style::default().fg(COUNTERFEIT)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(SHIELD)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn border_style(focused: bool) -> Style {
    Style::default().fg(if focused { SHIELD } else { MUTED })
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(26, 34, 38)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default().fg(CAUTION).add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

/// Bar color for a verification share: the heavier the share, the warmer
pub fn share_style(percent: f64) -> Style {
    Style::default().fg(if percent >= 50.0 { CAUTION } else { GENUINE })
}

/// Daily verification bars on the trends page
pub fn trend_bar_style() -> Style {
    Style::default().fg(GENUINE)
}

pub fn subscription_status_style(status: SubscriptionStatus) -> Style {
    match status {
        SubscriptionStatus::Active => Style::default().fg(GENUINE).add_modifier(Modifier::BOLD),
        SubscriptionStatus::Expired => Style::default().fg(CAUTION),
        SubscriptionStatus::Suspended => Style::default().fg(COUNTERFEIT).add_modifier(Modifier::BOLD),
        SubscriptionStatus::Cancelled => muted_style(),
    }
}

/// How alarming a repeatedly checked code looks
pub fn verification_risk_style(checks: u64) -> Style {
    if checks >= COUNTERFEIT_CHECKS {
        Style::default().fg(COUNTERFEIT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(CAUTION)
    }
}

/// Usage against a monthly plan limit
pub fn quota_style(used: u64, limit: PlanLimit) -> Style {
    let max = match limit {
        PlanLimit::Unlimited => return Style::default().fg(GENUINE),
        PlanLimit::Limited(max) => max,
    };
    let percent = if max == 0 { 100 } else { used.saturating_mul(100) / max };
    let color = if percent >= QUOTA_FULL_PERCENT {
        COUNTERFEIT
    } else if percent >= QUOTA_WARN_PERCENT {
        CAUTION
    } else {
        GENUINE
    };
    Style::default().fg(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_risk_style() {
        assert_eq!(verification_risk_style(2).fg, Some(CAUTION));
        assert_eq!(verification_risk_style(4).fg, Some(COUNTERFEIT));
        assert_eq!(verification_risk_style(40).fg, Some(COUNTERFEIT));
    }

    #[test]
    fn test_quota_style_thresholds() {
        assert_eq!(quota_style(10, PlanLimit::Limited(100)).fg, Some(GENUINE));
        assert_eq!(quota_style(75, PlanLimit::Limited(100)).fg, Some(CAUTION));
        assert_eq!(quota_style(95, PlanLimit::Limited(100)).fg, Some(COUNTERFEIT));
        assert_eq!(quota_style(0, PlanLimit::Limited(0)).fg, Some(COUNTERFEIT));
        assert_eq!(quota_style(1_000_000, PlanLimit::Unlimited).fg, Some(GENUINE));
    }

    #[test]
    fn test_subscription_status_style() {
        assert_eq!(subscription_status_style(SubscriptionStatus::Active).fg, Some(GENUINE));
        assert_eq!(subscription_status_style(SubscriptionStatus::Suspended).fg, Some(COUNTERFEIT));
        assert_eq!(subscription_status_style(SubscriptionStatus::Cancelled).fg, Some(MUTED));
    }
}
