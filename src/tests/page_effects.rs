use super::*;
use crate::effects::{FORM_GROUP_HIDDEN, FORM_GROUP_VISIBLE, MENU_HIDE_CLASS, MENU_SHOW_CLASS};

fn displayed_number(page: &Page, selector: &str) -> Result<u64> {
    let text = page.text(selector)?;
    text.replace(',', "")
        .parse::<u64>()
        .map_err(|err| Error::Runtime(format!("counter text '{text}' is not a number: {err}")))
}

#[test]
fn counter_runs_from_one_to_exactly_1234() -> Result<()> {
    let mut page = Page::from_html(r#"<body><span id="members">1234</span></body>"#)?;
    let slot = page.animate_counter("#members", 1234)?;
    page.assert_text("#members", "1")?;

    let mut frames = 0;
    while page.run_next_timer()? {
        frames += 1;
        assert!(displayed_number(&page, "#members")? <= 1234);
    }
    page.assert_text("#members", "1,234")?;
    assert!(page.animation_finished(slot));
    assert_eq!(frames, 50);
    assert_eq!(page.now_ms(), 1000);
    assert!(page.pending_timers().is_empty());
    Ok(())
}

#[test]
fn counter_waits_until_scrolled_into_view() -> Result<()> {
    let mut page = Page::from_html(r#"<body><span id="members">0</span></body>"#)?;
    page.set_rect("#members", Rect::new(2000.0, 0.0, 120.0, 40.0))?;
    let slot = page.animate_counter("#members", 250)?;

    page.flush()?;
    page.assert_text("#members", "0")?;
    assert_eq!(page.listener_count("window", "scroll")?, 1);

    page.scroll_to(900.0)?;
    page.flush()?;
    page.assert_text("#members", "0")?;

    // bottom edge 2040 less the 40px margin sits above the viewport bottom 1300 + 768
    page.scroll_to(1300.0)?;
    page.assert_text("#members", "1")?;
    page.flush()?;
    page.assert_text("#members", "250")?;
    assert!(page.animation_finished(slot));

    // the scroll listener is gone; scrolling again changes nothing
    assert_eq!(page.listener_count("window", "scroll")?, 0);
    page.set_rect("#members", Rect::new(0.0, 0.0, 120.0, 40.0))?;
    page.scroll_to(0.0)?;
    assert!(page.pending_timers().is_empty());
    page.assert_text("#members", "250")?;
    Ok(())
}

#[test]
fn slide_in_offsets_then_returns_to_natural_position() -> Result<()> {
    let mut page = Page::from_html(r#"<body><div id="panel" style="color: red;">Hi</div></body>"#)?;
    page.set_rect("#panel", Rect::new(1500.0, 0.0, 300.0, 100.0))?;
    page.slide_into_view("#panel", 100.0, SlideDirection::Left)?;

    page.assert_style("#panel", "position", Some("relative"))?;
    page.assert_style("#panel", "left", Some("-100px"))?;
    page.flush()?;
    page.assert_style("#panel", "left", Some("-100px"))?;

    page.scroll_to(1000.0)?;
    page.advance_time(30)?;
    page.assert_style("#panel", "left", Some("-70px"))?;

    page.flush()?;
    page.assert_style("#panel", "left", None)?;
    page.assert_style("#panel", "position", None)?;
    page.assert_style("#panel", "color", Some("red"))?;
    assert!(page.pending_timers().is_empty());
    Ok(())
}

#[test]
fn slide_from_below_uses_top_offset() -> Result<()> {
    let mut page = Page::from_html(r#"<body><div id="card">Card</div></body>"#)?;
    page.slide_into_view("#card", 25.0, SlideDirection::Down)?;
    // already in view, so it starts immediately
    assert_eq!(page.pending_timers().len(), 1);
    page.assert_style("#card", "top", Some("25px"))?;
    page.advance_time(10)?;
    page.assert_style("#card", "top", Some("15px"))?;
    page.flush()?;
    assert_eq!(page.attr("#card", "style")?, None);
    Ok(())
}

#[test]
fn menu_toggle_switches_between_show_and_hide_classes() -> Result<()> {
    let html = r#"
    <body>
      <div>
        <span class="js-header-nav-menu-toggle-button">toggle</span>
        <span class="js-header-nav-menu js-header-nav-menu-hide">menu contents</span>
      </div>
    </body>
    "#;
    let mut page = Page::from_html(html)?;
    assert!(page.install_menu_toggle()?);
    assert!(!page.menus()[0].is_shown());

    page.click(".js-header-nav-menu-toggle-button")?;
    assert_eq!(
        page.attr(".js-header-nav-menu", "class")?.as_deref(),
        Some(MENU_SHOW_CLASS)
    );
    page.click(".js-header-nav-menu-toggle-button")?;
    assert_eq!(
        page.attr(".js-header-nav-menu", "class")?.as_deref(),
        Some(MENU_HIDE_CLASS)
    );
    Ok(())
}

#[test]
fn menu_toggle_is_skipped_without_its_elements() -> Result<()> {
    let mut page = Page::from_html(r#"<body><nav class="js-header-nav-menu"></nav></body>"#)?;
    assert!(!page.install_menu_toggle()?);
    assert!(page.menus().is_empty());
    Ok(())
}

const MARKETING_FORM: &str = r#"
<form>
  <select id="id_marketing_source" name="marketing_source">
    <option value="">---------</option>
    <option value="Bank">Bank</option>
    <option value="Social media">Social media</option>
    <option value="other">Other</option>
  </select>
  <div id="marketing_source_bank" class="form-group">
    <input id="id_marketing_source_bank" value="Barclays">
  </div>
  <div id="marketing_source_other" class="form-group">
    <input id="id_marketing_source_other" value="A friend">
  </div>
</form>
"#;

#[test]
fn marketing_source_shows_the_matching_follow_up_field() -> Result<()> {
    let mut page = Page::from_html(MARKETING_FORM)?;
    assert!(page.install_marketing_source()?);
    let class_of = |page: &Page, selector: &str| page.attr(selector, "class");

    assert_eq!(class_of(&page, "#marketing_source_bank")?.as_deref(), Some(FORM_GROUP_HIDDEN));
    assert_eq!(class_of(&page, "#marketing_source_other")?.as_deref(), Some(FORM_GROUP_HIDDEN));
    page.assert_value("#id_marketing_source_bank", "")?;
    page.assert_value("#id_marketing_source_other", "")?;

    page.select_option("#id_marketing_source", "Bank")?;
    assert_eq!(class_of(&page, "#marketing_source_bank")?.as_deref(), Some(FORM_GROUP_VISIBLE));
    page.type_text("#id_marketing_source_bank", "HSBC")?;

    page.select_option("#id_marketing_source", "other")?;
    assert_eq!(class_of(&page, "#marketing_source_bank")?.as_deref(), Some(FORM_GROUP_HIDDEN));
    assert_eq!(class_of(&page, "#marketing_source_other")?.as_deref(), Some(FORM_GROUP_VISIBLE));
    page.assert_value("#id_marketing_source_bank", "")?;
    page.type_text("#id_marketing_source_other", "Podcast")?;

    page.select_option("#id_marketing_source", "Social media")?;
    page.assert_value("#id_marketing_source_other", "")?;
    assert_eq!(class_of(&page, "#marketing_source_other")?.as_deref(), Some(FORM_GROUP_HIDDEN));

    let err = page
        .select_option("#id_marketing_source", "Radio")
        .expect_err("not an option");
    assert!(matches!(err, Error::Runtime(_)));
    Ok(())
}

#[test]
fn marketing_source_with_missing_wrapper_reports_the_id() -> Result<()> {
    let mut page = Page::from_html(r#"<select id="id_marketing_source"><option>x</option></select>"#)?;
    let err = page
        .install_marketing_source()
        .expect_err("wrappers are required");
    assert_eq!(err, Error::SelectorNotFound("#marketing_source_bank".into()));
    Ok(())
}

#[test]
fn enhance_installs_what_the_markup_asks_for() -> Result<()> {
    let html = r##"
    <body>
      <span class="js-header-nav-menu-toggle-button">toggle</span>
      <nav class="js-header-nav-menu">links</nav>
      <input id="id_company_name" data-selective-lookup="company" data-lookup-target="#id_company_number">
      <input id="id_company_number" type="hidden">
      <strong id="exporters" data-counter-end="1,500">0</strong>
      <div id="promo" data-slide-offset="40" data-slide-direction="right">Promo</div>
    </body>
    "##;
    let mut page = Page::from_html(html)?;
    page.set_location("/?utm_source=gov");
    page.set_lookup_mock("acme", r#"[{"title":"Acme Ltd","company_number":"001"}]"#);

    let report = page.enhance()?;
    assert_eq!(report.lookups.len(), 1);
    assert!(report.menu_toggle);
    assert!(!report.marketing_source);
    assert_eq!(report.counters, 1);
    assert_eq!(report.slides, 1);
    assert!(report.utm_written);

    page.flush()?;
    page.assert_text("#exporters", "1,500")?;
    assert_eq!(page.attr("#promo", "style")?, None);

    page.type_text("#id_company_name", "acme")?;
    page.flush()?;
    page.click(".SelectiveLookupDisplay li")?;
    page.assert_value("#id_company_number", "001")?;

    page.click(".js-header-nav-menu-toggle-button")?;
    assert_eq!(
        page.attr(".js-header-nav-menu", "class")?.as_deref(),
        Some(MENU_HIDE_CLASS)
    );
    Ok(())
}

#[test]
fn enhance_on_a_bare_page_installs_nothing() -> Result<()> {
    let mut page = Page::from_html("<body><p>Nothing here</p></body>")?;
    let report = page.enhance()?;
    assert_eq!(report, EnhanceReport::default());
    Ok(())
}

#[test]
fn custom_animations_run_through_the_same_scheduler() -> Result<()> {
    struct Blink {
        element: NodeId,
        remaining: u32,
    }

    impl Animation for Blink {
        fn step(&mut self, dom: &mut Dom) -> Result<StepOutcome> {
            dom.class_toggle(self.element, "lit")?;
            self.remaining -= 1;
            Ok(if self.remaining == 0 {
                StepOutcome::Finished
            } else {
                StepOutcome::Continue
            })
        }

        fn name(&self) -> &'static str {
            "blink"
        }
    }

    let mut page = Page::from_html(r#"<body><i id="dot"></i></body>"#)?;
    let element = page.dom().by_id("dot").expect("dot exists");
    let slot = page.animate_when_visible(
        "#dot",
        Blink {
            element,
            remaining: 3,
        },
        100,
    )?;

    page.advance_time(250)?;
    page.assert_class("#dot", "lit", false)?;
    assert!(!page.animation_finished(slot));
    page.advance_time(50)?;
    page.assert_class("#dot", "lit", true)?;
    assert!(page.animation_finished(slot));
    assert!(page.pending_timers().is_empty());

    let err = page
        .animate_when_visible("#dot", Blink { element, remaining: 1 }, 0)
        .expect_err("zero interval");
    assert!(matches!(err, Error::Config(_)));
    Ok(())
}
