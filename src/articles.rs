// Copyright 2026 The Shopclerk Project
// SPDX-License-Identifier: Apache-2.0

// Help-article browser content.
//
// Static store FAQ articles shown in the widget's help screen. The
// search filter matches the original widget: case-insensitive substring
// match over titles.

/// One help article.
#[derive(Debug)]
pub struct Article {
    pub title: &'static str,
    pub author: &'static str,
    /// Human-readable freshness label, shown as-is.
    pub updated: &'static str,
    /// Article body, already HTML.
    pub content: &'static str,
}

/// The article catalogue, in display order.
pub static ARTICLES: &[Article] = &[
    Article {
        title: "How long will it take to receive my order?",
        author: "Jesse",
        updated: "over a year ago",
        content: "\
<p>Thank you for your order! Delivery times vary based on your location and the \
shipping method selected during checkout. Generally, orders are processed within \
<strong>1-2 business days</strong>.</p>\
<h2>Domestic Shipping (within your country)</h2>\
<ul>\
<li><strong>Standard Shipping:</strong> 5-7 business days</li>\
<li><strong>Express Shipping:</strong> 2-3 business days</li>\
</ul>\
<h2>International Shipping</h2>\
<p>International orders typically take <strong>7-21 business days</strong> depending \
on customs clearance in the destination country. Please note that customs duties and \
taxes may apply upon arrival.</p>\
<p>You will receive a shipping confirmation email with a tracking number once your \
order has been dispatched.</p>\
<p>If you have any further questions, please don't hesitate to contact our support team.</p>",
    },
    Article {
        title: "How to track my order?",
        author: "Jesse",
        updated: "6 months ago",
        content: "\
<p>Tracking your order is easy! Once your order has shipped, you will receive an \
email with your tracking number and a link to the carrier's website.</p>\
<h2>Steps to Track Your Order:</h2>\
<ol>\
<li>Check your email for a shipping confirmation from us.</li>\
<li>Locate the tracking number in the email.</li>\
<li>Click on the provided tracking link, or visit the carrier's website and enter \
your tracking number manually.</li>\
</ol>\
<p>If you haven't received a tracking number within 2 business days of your purchase, \
please contact our customer support for assistance.</p>",
    },
    Article {
        title: "Do you ship internationally?",
        author: "Jesse",
        updated: "2 months ago",
        content: "\
<p>Yes, we proudly offer international shipping to most countries worldwide!</p>\
<p>Please note that international shipping times and costs vary depending on the \
destination. Any customs duties, taxes, or import fees are the responsibility of the \
recipient and are not included in the item price or shipping cost.</p>\
<p>During checkout, you will be able to see the available shipping options and \
estimated costs for your country.</p>",
    },
    Article {
        title: "I never got my order, what to do?",
        author: "Jesse",
        updated: "1 month ago",
        content: "\
<p>We're sorry to hear your order hasn't arrived! Please take the following steps:</p>\
<ol>\
<li><strong>Check your tracking information:</strong> Ensure there are no delivery \
exceptions or delays noted.</li>\
<li><strong>Verify your shipping address:</strong> Double-check that the address \
provided was correct.</li>\
<li><strong>Look around your delivery location:</strong> Sometimes packages are left \
in a secure location, with a neighbor, or at a local post office.</li>\
<li><strong>Wait a few more days:</strong> Occasionally, packages can be marked as \
delivered prematurely.</li>\
</ol>\
<p>If your order still hasn't arrived after these steps, please contact our support \
team with your order number, and we'll be happy to investigate further.</p>",
    },
    Article {
        title: "What is your return policy?",
        author: "Jesse",
        updated: "3 weeks ago",
        content: "\
<p>We want you to be completely satisfied with your purchase! Our return policy \
allows for returns within <strong>30 days of delivery</strong> for most items.</p>\
<p>Items must be unused, in their original packaging, and in the same condition that \
you received them. Some exclusions may apply (e.g., final sale items, personalized \
products).</p>\
<h2>How to initiate a return:</h2>\
<ol>\
<li>Contact our customer support team to request a Return Merchandise Authorization \
(RMA) number.</li>\
<li>Package your item securely with the RMA number clearly marked.</li>\
<li>Ship the item back to us using a trackable shipping method.</li>\
</ol>\
<p>Once your return is received and inspected, we will process your refund or \
exchange. Please allow 5-10 business days for the refund to appear on your statement.</p>",
    },
    Article {
        title: "Can I exchange an item?",
        author: "Jesse",
        updated: "2 weeks ago",
        content: "\
<p>Yes, we offer exchanges for items of equal value within <strong>30 days of \
delivery</strong>, subject to availability.</p>\
<p>To be eligible for an exchange, your item must be unused, in its original \
packaging, and in the same condition that you received it.</p>\
<h2>How to exchange an item:</h2>\
<ol>\
<li>Contact our customer support team to check availability of the desired item and \
receive exchange instructions.</li>\
<li>Ship your original item back to us.</li>\
<li>Once received and inspected, we will ship out your new item.</li>\
</ol>\
<p>If there's a price difference, we will guide you through the process of either \
paying the difference or receiving a partial refund.</p>",
    },
];

/// Look up an article by exact title.
pub fn find(title: &str) -> Option<&'static Article> {
    ARTICLES.iter().find(|a| a.title == title)
}

/// Case-insensitive substring search over titles.
pub fn search(term: &str) -> Vec<&'static Article> {
    let term = term.to_lowercase();
    ARTICLES
        .iter()
        .filter(|a| a.title.to_lowercase().contains(&term))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_by_exact_title() {
        assert!(find("How to track my order?").is_some());
        assert!(find("nonexistent article").is_none());
    }

    #[test]
    fn search_is_case_insensitive() {
        let hits = search("ORDER");
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|a| a.title.to_lowercase().contains("order")));
    }

    #[test]
    fn empty_search_returns_everything() {
        assert_eq!(search("").len(), ARTICLES.len());
    }

    #[test]
    fn search_with_no_hits_is_empty() {
        assert!(search("gift wrapping").is_empty());
    }
}
