//! Standard PAC helper functions.

use rquickjs::Ctx;

/// The functions every PAC script may call, in plain JavaScript.
///
/// Name resolution is limited to IP literals: `dnsResolve` never touches the
/// network, and `myIpAddress` always answers the loopback address.
const PAC_HELPERS: &str = r#"
    function __ipv4(value) {
        var m = /^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$/.exec(String(value));
        if (!m) return null;
        var n = 0;
        for (var i = 1; i <= 4; i++) {
            var octet = parseInt(m[i], 10);
            if (octet > 255) return null;
            n = n * 256 + octet;
        }
        return n;
    }

    function __gmt(args) {
        if (args.length > 0 && args[args.length - 1] === 'GMT') {
            args.pop();
            return true;
        }
        return false;
    }

    var __DAYS = ['SUN', 'MON', 'TUE', 'WED', 'THU', 'FRI', 'SAT'];
    var __MONTHS = ['JAN', 'FEB', 'MAR', 'APR', 'MAY', 'JUN',
                    'JUL', 'AUG', 'SEP', 'OCT', 'NOV', 'DEC'];

    function isPlainHostName(host) {
        return String(host).indexOf('.') === -1;
    }

    function dnsDomainIs(host, domain) {
        host = String(host).toLowerCase();
        domain = String(domain).toLowerCase();
        return host.length >= domain.length &&
            host.substring(host.length - domain.length) === domain;
    }

    function localHostOrDomainIs(host, hostdom) {
        host = String(host).toLowerCase();
        hostdom = String(hostdom).toLowerCase();
        return host === hostdom || hostdom.lastIndexOf(host + '.', 0) === 0;
    }

    function dnsResolve(host) {
        return __ipv4(host) !== null ? String(host) : null;
    }

    function isResolvable(host) {
        return dnsResolve(host) !== null;
    }

    function myIpAddress() {
        return '127.0.0.1';
    }

    function isInNet(host, pattern, mask) {
        var h = __ipv4(dnsResolve(host));
        var p = __ipv4(pattern);
        var m = __ipv4(mask);
        if (h === null || p === null || m === null) return false;
        return ((h & m) >>> 0) === ((p & m) >>> 0);
    }

    function dnsDomainLevels(host) {
        return String(host).split('.').length - 1;
    }

    function shExpMatch(str, shexp) {
        var pattern = String(shexp)
            .replace(/[.+^${}()|[\]\\]/g, '\\$&')
            .replace(/\*/g, '.*')
            .replace(/\?/g, '.');
        return new RegExp('^' + pattern + '$').test(String(str));
    }

    function weekdayRange() {
        var args = Array.prototype.slice.call(arguments);
        var gmt = __gmt(args);
        var now = new Date();
        var today = gmt ? now.getUTCDay() : now.getDay();
        var from = __DAYS.indexOf(String(args[0]).toUpperCase());
        if (from < 0) return false;
        if (args.length < 2) return today === from;
        var to = __DAYS.indexOf(String(args[1]).toUpperCase());
        if (to < 0) return false;
        return from <= to ? (today >= from && today <= to) : (today >= from || today <= to);
    }

    function timeRange() {
        var args = Array.prototype.slice.call(arguments);
        var gmt = __gmt(args);
        var now = new Date();
        var h = gmt ? now.getUTCHours() : now.getHours();
        var m = gmt ? now.getUTCMinutes() : now.getMinutes();
        var s = gmt ? now.getUTCSeconds() : now.getSeconds();
        var current = h * 3600 + m * 60 + s;
        var from, to;
        switch (args.length) {
            case 1:
                return h === args[0];
            case 2:
                from = args[0] * 3600;
                to = args[1] * 3600 - 1;
                break;
            case 4:
                from = args[0] * 3600 + args[1] * 60;
                to = args[2] * 3600 + args[3] * 60;
                break;
            case 6:
                from = args[0] * 3600 + args[1] * 60 + args[2];
                to = args[3] * 3600 + args[4] * 60 + args[5];
                break;
            default:
                return false;
        }
        return from <= to ? (current >= from && current <= to) : (current >= from || current <= to);
    }

    function dateRange() {
        var args = Array.prototype.slice.call(arguments);
        var gmt = __gmt(args);
        var now = new Date();
        var today = [
            gmt ? now.getUTCFullYear() : now.getFullYear(),
            gmt ? now.getUTCMonth() : now.getMonth(),
            gmt ? now.getUTCDate() : now.getDate()
        ];
        function point(parts) {
            var p = [null, null, null];
            for (var i = 0; i < parts.length; i++) {
                var v = parts[i];
                if (typeof v === 'string') {
                    var month = __MONTHS.indexOf(v.toUpperCase());
                    if (month < 0) return null;
                    p[1] = month;
                } else if (v > 31) {
                    p[0] = v;
                } else {
                    p[2] = v;
                }
            }
            return p;
        }
        function compare(a, b) {
            for (var i = 0; i < 3; i++) {
                if (a[i] === null || b[i] === null || a[i] === b[i]) continue;
                return a[i] < b[i] ? -1 : 1;
            }
            return 0;
        }
        if (args.length === 1) {
            var only = point(args);
            return only !== null && compare(only, today) === 0;
        }
        if (args.length === 0 || args.length % 2 !== 0) return false;
        var from = point(args.slice(0, args.length / 2));
        var to = point(args.slice(args.length / 2));
        if (from === null || to === null) return false;
        var afterStart = compare(from, today) <= 0;
        var beforeEnd = compare(today, to) <= 0;
        return compare(from, to) <= 0 ? (afterStart && beforeEnd) : (afterStart || beforeEnd);
    }
"#;

/// Defines the PAC helper functions in the global scope of `ctx`.
pub(super) fn install_pac_helpers(ctx: &Ctx<'_>) -> rquickjs::Result<()> {
    ctx.eval::<(), _>(PAC_HELPERS)
}
