#![cfg(target_arch = "wasm32")]

use dom_mirror::{web::WebHost, Dom, ElementOptions, Host, Node};
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, Element, HtmlBodyElement};

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

fn body() -> Element {
	unsafe {
		if !LOG_INITIALIZED {
			//TODO: Fail on Warnig or Error.
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}

	window().unwrap().document().unwrap().body().unwrap().dyn_into::<HtmlBodyElement>().unwrap().into()
}

#[wasm_bindgen_test]
fn create_and_mirror() {
	let host = WebHost::new().unwrap();
	let node = Node::create(&host, "div", ElementOptions::new().class("card").content("Hello dom-mirror!").attribute("id", "web-create")).unwrap();
	node.insert_into(&body()).unwrap();

	assert_eq!(node.live().tag_name(), "DIV");
	assert_eq!(node.live().text_content().as_deref(), Some("Hello dom-mirror!"));
	assert_eq!(node.live().class_name(), "card");

	node.add_class("wide").unwrap().set_attribute("title", "t").unwrap().set_attribute("title", "u").unwrap();
	assert_eq!(node.live().class_name(), "card wide");
	assert_eq!(node.live().get_attribute("title").as_deref(), Some("t"));

	let adopted = Dom::new(host).select_one("#web-create").unwrap().unwrap();
	assert_eq!(&*adopted.classes(), ["card", "wide"]);
	assert_eq!(adopted.attributes().get("title").map(String::as_str), Some("t"));

	let _removal = node.remove(Duration::from_secs(0), None).unwrap();
	assert!(node.live().parent_node().is_none());
}

#[wasm_bindgen_test]
fn out_of_band_changes_are_visible_to_queries() {
	let host = WebHost::new().unwrap();
	let element = host.create_element("span").unwrap();
	let node = Node::adopt(&host, element.clone());

	element.class_list().add_1("late").unwrap();
	element.set_attribute("hidden", "").unwrap();
	assert!(node.has_class("late"));
	assert!(node.has_attribute("hidden"));
	assert!(node.classes().is_empty());
}

#[wasm_bindgen_test]
fn deep_clone() {
	let host = WebHost::new().unwrap();
	let list = Node::create(&host, "ul", ElementOptions::new().class("menu")).unwrap();
	Node::create(&host, "li", ElementOptions::new()).unwrap().insert_into(&list).unwrap();

	let copy = list.clone_node(true).unwrap();
	assert_eq!(copy.qsa("li").unwrap().count(), 1);
	copy.add_class("copy").unwrap();
	assert_eq!(&*list.classes(), ["menu"]);
	assert!(!list.has_class("copy"));
}

#[wasm_bindgen_test]
fn cancelled_removal_stays_attached() {
	let host = WebHost::new().unwrap();
	let node = Node::create(&host, "p", ElementOptions::new()).unwrap();
	node.insert_into(&body()).unwrap();

	let mut removal = node.remove(Duration::from_millis(50), Some("fading")).unwrap();
	assert!(removal.is_pending());
	assert!(node.has_class("fading"));
	assert!(removal.cancel());

	node.unbind_from_dom().unwrap();
}
