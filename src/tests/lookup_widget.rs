use std::cell::RefCell;
use std::rc::Rc;

use super::*;

const COMPANY_FORM: &str = r#"
<html>
  <body>
    <form id="enrol">
      <input id="id_company_name" name="company_name" type="text">
      <input id="id_company_number" name="company_number" type="hidden">
    </form>
    <p id="elsewhere">Elsewhere</p>
  </body>
</html>
"#;

const THREE_COMPANIES: &str = r#"[
  {"title": "Acme Ltd", "company_number": "001"},
  {"title": "Acme Holdings", "company_number": "002"},
  {"title": "Acme Trading", "company_number": "003"}
]"#;

fn company_page() -> Result<(Page, WidgetId)> {
    let mut page = Page::from_html(COMPANY_FORM)?;
    let id = page.bind_company_lookup("#id_company_name", "#id_company_number")?;
    Ok((page, id))
}

fn slow_company_page(latency_ms: i64) -> Result<(Page, WidgetId)> {
    let mut config = PageConfig::default();
    config.lookup.latency_ms = latency_ms;
    let mut page = Page::from_html_with_config(COMPANY_FORM, config)?;
    let id = page.bind_company_lookup("#id_company_name", "#id_company_number")?;
    Ok((page, id))
}

#[test]
fn input_below_threshold_issues_no_request() -> Result<()> {
    let (mut page, id) = company_page()?;
    page.type_text("#id_company_name", "acm")?;
    page.type_text("#id_company_name", "ａｃｍ")?;

    assert!(page.take_lookup_calls().is_empty());
    assert!(page.pending_timers().is_empty());
    assert_eq!(page.widget_state(id)?, LookupState::Idle);
    assert_eq!(page.count(".SelectiveLookupDisplay li")?, 0);
    Ok(())
}

#[test]
fn typing_acme_and_clicking_the_row_fills_both_fields() -> Result<()> {
    let (mut page, id) = company_page()?;
    page.set_lookup_mock("acme", r#"[{"title":"Acme Ltd","company_number":"001"}]"#);

    page.type_text("#id_company_name", "acme")?;
    assert_eq!(page.widget_state(id)?, LookupState::Querying);
    let calls = page.take_lookup_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].url, "/api/internal/companies-house-search/?term=acme");

    page.flush()?;
    assert_eq!(page.widget_state(id)?, LookupState::Open);
    assert_eq!(page.count(".SelectiveLookupDisplay li")?, 1);
    page.assert_text(".SelectiveLookupDisplay li", "Acme Ltd")?;
    assert_eq!(
        page.attr(".SelectiveLookupDisplay li", "data-value")?.as_deref(),
        Some("001")
    );
    page.assert_style(".SelectiveLookupDisplay", "display", Some("block"))?;
    page.assert_style(".SelectiveLookupDisplay", "position", Some("absolute"))?;

    page.click(".SelectiveLookupDisplay li")?;
    page.assert_value("#id_company_name", "Acme Ltd")?;
    page.assert_value("#id_company_number", "001")?;
    assert_eq!(page.widget_state(id)?, LookupState::Closed);
    page.assert_style(".SelectiveLookupDisplay", "display", Some("none"))?;
    Ok(())
}

#[test]
fn every_qualifying_keystroke_supersedes_the_previous_request() -> Result<()> {
    let (mut page, _) = slow_company_page(100)?;
    page.set_lookup_mock("acme", r#"[{"title":"Acme Ltd","company_number":"001"}]"#);
    page.set_lookup_mock(
        "acme ltd",
        r#"[{"title":"Acme Trading Ltd","company_number":"004"}]"#,
    );

    page.type_chars("#id_company_name", "acme ltd")?;
    let terms = page
        .take_lookup_calls()
        .into_iter()
        .map(|call| call.term)
        .collect::<Vec<_>>();
    assert_eq!(terms, vec!["acme", "acme", "acme l", "acme lt", "acme ltd"]);
    assert_eq!(page.pending_timers().len(), 1);

    page.flush()?;
    assert_eq!(page.count(".SelectiveLookupDisplay li")?, 1);
    page.assert_text(".SelectiveLookupDisplay li", "Acme Trading Ltd")?;
    Ok(())
}

#[test]
fn cancelled_request_never_renders() -> Result<()> {
    let (mut page, id) = slow_company_page(100)?;
    page.set_lookup_mock("acme", r#"[{"title":"Stale Ltd","company_number":"009"}]"#);
    page.set_lookup_mock("acme co", r#"[{"title":"Acme Co","company_number":"010"}]"#);

    page.type_text("#id_company_name", "acme")?;
    page.advance_time(50)?;
    page.type_text("#id_company_name", "acme co")?;

    page.advance_time(60)?;
    assert_eq!(page.widget_state(id)?, LookupState::Querying);
    assert_eq!(page.count(".SelectiveLookupDisplay li")?, 0);

    page.advance_time(50)?;
    assert_eq!(page.widget_state(id)?, LookupState::Open);
    page.assert_text(".SelectiveLookupDisplay", "Acme Co")?;
    Ok(())
}

#[test]
fn empty_result_renders_one_unselectable_row() -> Result<()> {
    let (mut page, id) = company_page()?;
    page.set_lookup_mock("zzzz", "[]");

    page.type_text("#id_company_name", "zzzz")?;
    page.flush()?;
    assert_eq!(page.count(".SelectiveLookupDisplay li")?, 1);
    page.assert_text(".SelectiveLookupDisplay li.no-results", "No results found")?;
    assert_eq!(page.attr("li.no-results", "data-value")?, None);

    page.click("li.no-results")?;
    page.assert_value("#id_company_name", "zzzz")?;
    page.assert_value("#id_company_number", "")?;
    assert_eq!(page.widget_state(id)?, LookupState::Open);
    Ok(())
}

#[test]
fn failed_lookup_is_shown_as_no_results() -> Result<()> {
    let (mut page, _) = company_page()?;
    page.set_lookup_failure("acme", "503 Service Unavailable");

    page.type_text("#id_company_name", "acme")?;
    page.flush()?;
    page.assert_text(".SelectiveLookupDisplay", "No results found")?;
    Ok(())
}

#[test]
fn response_for_a_field_the_user_left_is_not_rendered() -> Result<()> {
    let (mut page, id) = slow_company_page(100)?;
    page.set_lookup_mock("acme", THREE_COMPANIES);

    page.type_text("#id_company_name", "acme")?;
    page.blur("#id_company_name")?;
    page.flush()?;

    assert_eq!(page.widget_state(id)?, LookupState::Closed);
    assert!(!page.widget(id)?.is_active());
    assert_eq!(page.count(".SelectiveLookupDisplay li")?, 0);
    Ok(())
}

#[test]
fn arrow_keys_wrap_and_enter_selects_the_highlighted_row() -> Result<()> {
    let (mut page, id) = company_page()?;
    page.set_lookup_mock("acme", THREE_COMPANIES);
    page.type_text("#id_company_name", "acme")?;
    page.flush()?;

    assert!(page.press_key("#id_company_name", "ArrowDown")?);
    page.assert_text(".SelectiveLookupDisplay li.active", "Acme Ltd")?;
    page.press_key("#id_company_name", "ArrowDown")?;
    page.assert_text(".SelectiveLookupDisplay li.active", "Acme Holdings")?;
    page.press_key("#id_company_name", "ArrowUp")?;
    page.press_key("#id_company_name", "ArrowUp")?;
    page.assert_text(".SelectiveLookupDisplay li.active", "Acme Trading")?;
    assert_eq!(page.count(".SelectiveLookupDisplay li.active")?, 1);
    assert_eq!(page.widget(id)?.highlighted(), Some(2));

    assert!(page.press_key("#id_company_name", "Enter")?);
    page.assert_value("#id_company_name", "Acme Trading")?;
    page.assert_value("#id_company_number", "003")?;
    assert_eq!(page.widget_state(id)?, LookupState::Closed);

    // ignored once closed
    assert!(!page.press_key("#id_company_name", "Enter")?);
    assert!(!page.press_key("#id_company_name", "a")?);
    Ok(())
}

#[test]
fn escape_closes_and_aborts_a_pending_lookup() -> Result<()> {
    let (mut page, id) = slow_company_page(100)?;
    page.set_lookup_mock("acme", THREE_COMPANIES);

    page.type_text("#id_company_name", "acme")?;
    page.flush()?;
    assert!(page.press_key("#id_company_name", "Escape")?);
    assert_eq!(page.widget_state(id)?, LookupState::Closed);
    page.assert_style(".SelectiveLookupDisplay", "display", Some("none"))?;
    assert!(!page.press_key("#id_company_name", "Escape")?);

    page.type_text("#id_company_name", "acme ltd")?;
    assert_eq!(page.pending_timers().len(), 1);
    assert!(page.press_key("#id_company_name", "Escape")?);
    assert!(page.pending_timers().is_empty());
    assert_eq!(page.widget(id)?.service().in_flight(), None);
    Ok(())
}

#[test]
fn outside_click_closes_every_open_dropdown() -> Result<()> {
    let html = r#"
    <body>
      <input id="company_a"><input id="number_a" type="hidden">
      <input id="company_b"><input id="number_b" type="hidden">
      <p id="elsewhere">Elsewhere</p>
    </body>
    "#;
    let mut page = Page::from_html(html)?;
    let options_a = page.lookup_options().target("#number_a").close_on_blur(false);
    let options_b = page.lookup_options().target("#number_b").close_on_blur(false);
    let a = page.bind_lookup("#company_a", options_a, CompanyLookupAdapter::new())?;
    let b = page.bind_lookup("#company_b", options_b, CompanyLookupAdapter::new())?;
    page.set_lookup_mock("acme", THREE_COMPANIES);

    page.type_text("#company_a", "acme")?;
    page.flush()?;
    page.type_text("#company_b", "acme")?;
    page.flush()?;
    assert_eq!(page.widget_state(a)?, LookupState::Open);
    assert_eq!(page.widget_state(b)?, LookupState::Open);

    page.click("#elsewhere")?;
    assert_eq!(page.widget_state(a)?, LookupState::Closed);
    assert_eq!(page.widget_state(b)?, LookupState::Closed);
    assert_eq!(page.close_all()?, 0);
    Ok(())
}

#[test]
fn clicking_inside_one_widget_closes_only_the_others() -> Result<()> {
    let html = r#"
    <body>
      <input id="company_a"><input id="company_b">
    </body>
    "#;
    let mut page = Page::from_html(html)?;
    let options = page.lookup_options().close_on_blur(false);
    let a = page.bind_lookup("#company_a", options.clone(), CompanyLookupAdapter::new())?;
    let b = page.bind_lookup("#company_b", options, CompanyLookupAdapter::new())?;
    page.set_lookup_mock("acme", THREE_COMPANIES);
    page.type_text("#company_a", "acme")?;
    page.type_text("#company_b", "acme")?;
    page.flush()?;
    // a lost focus before its response arrived
    assert_eq!(page.widget_state(a)?, LookupState::Idle);
    assert_eq!(page.widget_state(b)?, LookupState::Open);

    page.type_text("#company_a", "acme")?;
    page.flush()?;
    assert_eq!(page.widget_state(a)?, LookupState::Open);

    page.click("#company_a")?;
    assert_eq!(page.widget_state(a)?, LookupState::Open);
    assert_eq!(page.widget_state(b)?, LookupState::Closed);
    Ok(())
}

#[test]
fn editing_after_a_selection_clears_the_stale_company_number() -> Result<()> {
    let (mut page, _) = company_page()?;
    page.set_lookup_mock("acme", r#"[{"title":"Acme Ltd","company_number":"001"}]"#);
    page.type_text("#id_company_name", "acme")?;
    page.flush()?;
    page.click(".SelectiveLookupDisplay li")?;
    page.assert_value("#id_company_number", "001")?;

    page.type_text("#id_company_name", "Acme Lt")?;
    page.assert_value("#id_company_number", "")?;
    Ok(())
}

#[test]
fn dropdown_sits_below_the_input_and_follows_resize() -> Result<()> {
    let (mut page, _) = company_page()?;
    page.set_rect("#id_company_name", Rect::new(100.0, 20.0, 300.0, 30.0))?;
    page.set_lookup_mock("acme", THREE_COMPANIES);
    page.type_text("#id_company_name", "acme")?;
    page.flush()?;

    page.assert_style(".SelectiveLookupDisplay", "top", Some("130px"))?;
    page.assert_style(".SelectiveLookupDisplay", "left", Some("20px"))?;
    page.assert_style(".SelectiveLookupDisplay", "width", Some("300px"))?;

    page.set_rect("#id_company_name", Rect::new(200.0, 40.0, 250.0, 30.0))?;
    page.resize(800.0, 600.0)?;
    page.assert_style(".SelectiveLookupDisplay", "top", Some("230px"))?;
    page.assert_style(".SelectiveLookupDisplay", "left", Some("40px"))?;
    page.assert_style(".SelectiveLookupDisplay", "width", Some("250px"))?;
    Ok(())
}

#[test]
fn max_results_and_extra_dropdown_class_apply() -> Result<()> {
    let mut page = Page::from_html(COMPANY_FORM)?;
    let options = page
        .lookup_options()
        .target("#id_company_number")
        .max_results(2)
        .dropdown_class("company-results");
    page.bind_lookup("#id_company_name", options, CompanyLookupAdapter::new())?;
    page.set_lookup_mock("acme", THREE_COMPANIES);

    page.type_text("#id_company_name", "acme")?;
    page.flush()?;
    assert_eq!(page.count(".company-results li")?, 2);
    assert_eq!(page.count(".SelectiveLookupDisplay.company-results")?, 1);
    Ok(())
}

#[test]
fn extra_service_listeners_only_see_accepted_responses() -> Result<()> {
    let (mut page, id) = slow_company_page(100)?;
    let seen = Rc::new(RefCell::new(Vec::new()));
    {
        let seen = Rc::clone(&seen);
        page.on_lookup_response(id, move |response| {
            seen.borrow_mut().push(response.records().len());
        })?;
    }
    page.set_lookup_mock("acme", r#"[{"title":"Stale","company_number":"1"}]"#);
    page.set_lookup_mock("acme ltd", THREE_COMPANIES);

    page.type_text("#id_company_name", "acme")?;
    page.type_text("#id_company_name", "acme ltd")?;
    page.flush()?;
    assert_eq!(*seen.borrow(), vec![3]);
    assert_eq!(page.widget(id)?.service().requests_issued(), 2);
    Ok(())
}

#[test]
fn without_a_target_the_value_lands_in_the_input() -> Result<()> {
    let mut page = Page::from_html(r#"<input id="city">"#)?;
    let options = page.lookup_options().min_length(2);
    page.bind_lookup("#city", options, TextValueAdapter)?;
    page.set_lookup_mock("Lo", r#"[{"text":"London","value":"LDN"}]"#);

    page.type_text("#city", "Lo")?;
    page.flush()?;
    page.assert_text(".SelectiveLookupDisplay li", "London")?;
    page.click(".SelectiveLookupDisplay li")?;
    page.assert_value("#city", "LDN")?;
    Ok(())
}

#[test]
fn custom_transport_receives_requests() -> Result<()> {
    let (mut page, _) = company_page()?;
    let urls = Rc::new(RefCell::new(Vec::new()));
    {
        let urls = Rc::clone(&urls);
        page.set_transport(move |request: &LookupRequest| {
            urls.borrow_mut().push(request.url.clone());
            LookupOutcome::Body(r#"{"items":[{"title":"Via Transport","company_number":12}]}"#.into())
        });
    }

    page.type_text("#id_company_name", "acme & sons")?;
    page.flush()?;
    assert_eq!(
        *urls.borrow(),
        vec!["/api/internal/companies-house-search/?term=acme+%26+sons".to_string()]
    );
    page.assert_text(".SelectiveLookupDisplay li", "Via Transport")?;
    assert!(page.take_lookup_calls().is_empty());
    Ok(())
}

#[test]
fn binding_to_a_non_input_is_a_type_mismatch() -> Result<()> {
    let mut page = Page::from_html(r#"<div id="company"></div>"#)?;
    let err = page
        .bind_company_lookup("#company", "#company")
        .expect_err("div cannot host a lookup");
    match err {
        Error::TypeMismatch { expected, actual, .. } => {
            assert_eq!(expected, "input or textarea");
            assert_eq!(actual, "div");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = page
        .bind_company_lookup("#missing", "#company")
        .expect_err("missing input");
    assert_eq!(err, Error::SelectorNotFound("#missing".into()));
    Ok(())
}

#[test]
fn outside_click_hides_rows_left_visible_by_a_newer_query() -> Result<()> {
    let (mut page, id) = slow_company_page(100)?;
    page.set_lookup_mock("acme", THREE_COMPANIES);
    page.type_text("#id_company_name", "acme")?;
    page.flush()?;
    assert_eq!(page.widget_state(id)?, LookupState::Open);

    page.type_text("#id_company_name", "acme h")?;
    assert_eq!(page.widget_state(id)?, LookupState::Querying);
    assert!(page.widget(id)?.is_open());
    page.assert_style(".SelectiveLookupDisplay", "display", Some("block"))?;

    // the previous rows still answer the keyboard
    assert!(page.press_key("#id_company_name", "ArrowDown")?);
    page.assert_text(".SelectiveLookupDisplay li.active", "Acme Ltd")?;

    page.click("#elsewhere")?;
    page.assert_style(".SelectiveLookupDisplay", "display", Some("none"))?;
    assert_eq!(page.widget_state(id)?, LookupState::Closed);
    assert!(page.pending_timers().is_empty());

    page.flush()?;
    assert!(!page.widget(id)?.is_open());
    page.assert_style(".SelectiveLookupDisplay", "display", Some("none"))?;
    Ok(())
}

#[test]
fn selecting_a_visible_row_drops_the_pending_query() -> Result<()> {
    let (mut page, id) = slow_company_page(100)?;
    page.set_lookup_mock("acme", THREE_COMPANIES);
    page.type_text("#id_company_name", "acme")?;
    page.flush()?;

    page.type_text("#id_company_name", "acme h")?;
    assert_eq!(page.pending_timers().len(), 1);
    assert!(page.press_key("#id_company_name", "ArrowDown")?);
    assert!(page.press_key("#id_company_name", "Enter")?);
    page.assert_value("#id_company_name", "Acme Ltd")?;
    page.assert_value("#id_company_number", "001")?;
    assert!(page.pending_timers().is_empty());
    assert_eq!(page.widget(id)?.service().in_flight(), None);

    page.flush()?;
    assert_eq!(page.widget_state(id)?, LookupState::Closed);
    page.assert_style(".SelectiveLookupDisplay", "display", Some("none"))?;
    Ok(())
}

#[test]
fn shortening_below_the_threshold_cancels_the_pending_query() -> Result<()> {
    let (mut page, id) = slow_company_page(100)?;
    page.set_lookup_mock("acme", THREE_COMPANIES);

    page.type_text("#id_company_name", "acme")?;
    assert_eq!(page.pending_timers().len(), 1);
    page.type_text("#id_company_name", "acm")?;
    assert!(page.pending_timers().is_empty());
    assert_eq!(page.widget_state(id)?, LookupState::Closed);
    assert_eq!(page.take_lookup_calls().len(), 1);

    page.flush()?;
    assert_eq!(page.count(".SelectiveLookupDisplay li")?, 0);
    page.assert_style(".SelectiveLookupDisplay", "display", Some("none"))?;
    Ok(())
}
